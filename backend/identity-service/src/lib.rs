/// Identity Service Library
///
/// Account registration, sign-in and password reset for SocialSphere.
///
/// ## Modules
///
/// - `error`: Error types
/// - `gateway`: Validation and verification policy over the provider
/// - `mailer`: Verification and reset mail delivery
/// - `memory`: In-process identity provider
/// - `provider`: Identity provider port
/// - `security`: Password hashing
/// - `validators`: Input validation
pub mod error;
pub mod gateway;
pub mod mailer;
pub mod memory;
pub mod provider;
pub mod security;
pub mod validators;

// Re-export commonly used types
pub use error::{AuthError, AuthResult, MailError};
pub use gateway::IdentityGateway;
pub use mailer::{MailKind, Mailer, MemoryMailer, OutgoingMail};
pub use memory::MemoryIdentityProvider;
pub use provider::{AuthUser, IdentityProvider};
