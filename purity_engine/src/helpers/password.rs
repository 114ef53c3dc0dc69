use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(String);

impl From<argon2::password_hash::Error> for PasswordError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<String> for PasswordError {
    fn from(e: String) -> Self {
        Self(e)
    }
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Returns `false` for a wrong password and for a hash that can't be parsed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
