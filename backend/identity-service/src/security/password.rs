/// Password hashing and verification using Argon2id
use error_types::{AuthError, AuthResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with a fresh random salt
///
/// Returns a PHC-formatted string. Strength policy is enforced by the
/// gateway before this is reached.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Provider(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Constant-time check of `password` against a PHC hash
pub fn verify_password(password: &str, password_hash: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Provider(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Provider(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}
