/// Password hashing for the in-process identity provider
pub mod password;

pub use password::{hash_password, verify_password};
