/// Identity provider port
use error_types::AuthResult;
use serde::{Deserialize, Serialize};

/// Signed-in account as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// Hosted account service
///
/// Creating an account also opens a session for it. The provider itself does
/// not gate sign-in on verification; the gateway does.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    /// Fails with `AuthError::VerificationDispatch` if the mail cannot be sent
    async fn send_verification_email(&self, user: &AuthUser) -> AuthResult<()>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_out(&self) -> AuthResult<()>;
}
