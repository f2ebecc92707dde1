//! SocialSphere client core
//!
//! Umbrella crate re-exporting the workspace components for embedders and
//! the cross-crate integration tests under `tests/`.

pub use blob_store;
pub use document_store;
pub use error_types;
pub use feed_service;
pub use identity_service;
pub use social_service;
pub use sphere_app;

pub use error_types::{AuthError, Outcome, UploadError, WriteError};
pub use sphere_app::{AppContext, Config, InMemoryBackends, Route};
