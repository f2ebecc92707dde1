//! Shared error taxonomy for the SocialSphere client core
//!
//! Every backend call site converts provider-level failures into one of
//! three families before returning to a caller:
//!
//! - [`AuthError`] for the identity provider
//! - [`WriteError`] for the document store
//! - [`UploadError`] for the blob store
//!
//! UI layers that only need "did it work, and if not, what do I show"
//! collapse any of these into an [`Outcome`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity provider failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified.")]
    EmailNotVerified,

    #[error("Email already in use")]
    EmailAlreadyInUse,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("User not found")]
    UserNotFound,

    #[error("No signed-in user")]
    NoCurrentUser,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// The account was created but the verification message could not be sent
    #[error("Verification email could not be sent: {0}")]
    VerificationDispatch(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Document store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflicting concurrent write: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema violation: {0}")]
    Schema(String),
}

/// Blob store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Cannot read source file: {0}")]
    Source(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload interrupted: {0}")]
    Interrupted(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
pub type WriteResult<T> = Result<T, WriteError>;
pub type UploadResult<T> = Result<T, UploadError>;

impl From<UploadError> for WriteError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Source(msg) => WriteError::InvalidInput(msg),
            UploadError::Rejected(msg) => WriteError::Rejected(msg),
            UploadError::Interrupted(msg) => WriteError::Network(msg),
        }
    }
}

/// Success flag plus optional human-readable message
///
/// This is the only error shape handed to presentation code; views render
/// `message` inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::ok(),
            Err(e) => Outcome::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_ok() {
        let outcome: Outcome = Ok::<_, AuthError>(()).into();
        assert!(outcome.is_success());
        assert_eq!(outcome.message, None);
    }

    #[test]
    fn test_outcome_from_err_keeps_message() {
        let outcome: Outcome = Err::<(), _>(AuthError::EmailNotVerified).into();
        assert!(!outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Email not verified."));
    }

    #[test]
    fn test_upload_error_maps_to_write_error() {
        let err: WriteError = UploadError::Interrupted("connection reset".into()).into();
        assert_eq!(err, WriteError::Network("connection reset".into()));
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = serde_json::to_value(Outcome::failed("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "boom");
    }
}
