/// Identity gateway
///
/// Wraps the provider with input validation and the verification policy:
/// registration is only successful once the verification mail went out, and
/// sign-in is refused for unverified addresses.
use crate::provider::{AuthUser, IdentityProvider};
use crate::validators::{check_password, validate_email};
use error_types::{AuthError, AuthResult};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
}

fn check_email(email: &str) -> AuthResult<&str> {
    let email = email.trim();
    if !validate_email(email) {
        return Err(AuthError::InvalidEmail(email.to_string()));
    }
    Ok(email)
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Create the account and send address verification
    ///
    /// Returns the new user id. When verification dispatch fails the account
    /// still exists and `AuthError::VerificationDispatch` is returned. Either
    /// way the provider session is closed, so the user has to sign in once
    /// verified.
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<String> {
        let email = check_email(email)?;
        check_password(password)?;

        let user = self.provider.create_account(email, password).await?;
        info!(uid = %user.uid, "Registered account");

        let dispatched = self
            .provider
            .send_verification_email(&user)
            .await
            .map_err(|e| match e {
                AuthError::VerificationDispatch(_) => e,
                other => AuthError::VerificationDispatch(other.to_string()),
            });
        let signed_out = self.provider.sign_out().await;

        if let Err(e) = dispatched {
            warn!(uid = %user.uid, error = %e, "Account created without verification mail");
            if let Err(sign_out) = signed_out {
                warn!(uid = %user.uid, error = %sign_out, "Sign-out after registration failed");
            }
            return Err(e);
        }
        signed_out?;
        Ok(user.uid)
    }

    /// Sign in a verified account
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let email = check_email(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.provider.sign_in(email, password).await?;
        if !user.email_verified {
            self.provider.sign_out().await?;
            info!(uid = %user.uid, "Sign-in refused: email not verified");
            return Err(AuthError::EmailNotVerified);
        }

        info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    pub async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = check_email(email)?;
        self.provider.send_password_reset(email).await
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.provider.current_user()
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.provider.sign_out().await
    }
}
