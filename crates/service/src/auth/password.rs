//! Single adaptive hashing policy for every stored credential: Argon2id with a
//! random per-hash salt, stored as a PHC string.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

use crate::errors::ServiceError;

/// Hash verified when the login names no known account, so both failure paths
/// do the same amount of work.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("not-a-real-password").ok());

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Storage(format!("password hashing failed: {e}")))
}

/// Constant-time comparison happens inside `verify_password`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Burn one verification against the dummy hash.
pub fn verify_dummy(password: &str) {
    if let Some(h) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, h);
    }
}

pub fn check_strength(password: &str, min_len: usize) -> Result<(), ServiceError> {
    if password.chars().count() < min_len {
        return Err(ServiceError::WeakPassword { min: min_len });
    }
    Ok(())
}
