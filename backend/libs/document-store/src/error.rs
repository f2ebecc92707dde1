//! Document store error types

use error_types::WriteError;
use thiserror::Error;

/// A stored document did not match the schema it was read or written as
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("document {path}: {reason}")]
pub struct SchemaError {
    pub path: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Update or guarded delete on a document that does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Create on a document that already exists
    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl StoreError {
    /// True for failures caused by an existence precondition
    pub fn is_precondition_failure(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::AlreadyExists(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for WriteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath(msg) => WriteError::InvalidInput(msg),
            StoreError::NotFound(path) => WriteError::NotFound(path),
            StoreError::AlreadyExists(path) => WriteError::Conflict(path),
            StoreError::Rejected(msg) => WriteError::Rejected(msg),
            StoreError::Unavailable(msg) => WriteError::Network(msg),
            StoreError::Schema(e) => WriteError::Schema(e.to_string()),
        }
    }
}

impl From<SchemaError> for WriteError {
    fn from(err: SchemaError) -> Self {
        WriteError::Schema(err.to_string())
    }
}
