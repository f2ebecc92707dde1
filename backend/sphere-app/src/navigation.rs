//! Initial navigation decision

use identity_service::IdentityGateway;
use serde::Serialize;
use social_service::{ProfileStore, WriteResult};
use tracing::debug;

/// Screen the app opens on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// Login / register / forgot password
    Auth,
    /// Signed in, no profile document yet
    ProfileSetup { uid: String },
    Home { uid: String },
}

/// Signed-out or unverified sessions go to `Auth`; a verified user without
/// a profile finishes setup first.
pub async fn initial_route(identity: &IdentityGateway, profiles: &ProfileStore) -> WriteResult<Route> {
    let user = match identity.current_user() {
        Some(user) if user.email_verified => user,
        _ => return Ok(Route::Auth),
    };

    let route = match profiles.get_profile(&user.uid).await? {
        Some(_) => Route::Home { uid: user.uid },
        None => Route::ProfileSetup { uid: user.uid },
    };
    debug!(?route, "Initial route");
    Ok(route)
}
