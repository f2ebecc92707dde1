use thiserror::Error;

pub use error_types::{AuthError, AuthResult};

/// Mail transport failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}
