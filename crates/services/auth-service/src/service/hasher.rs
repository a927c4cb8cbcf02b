//! Password hashing seam.

use common::{AppError, AppResult};
use domain::Password;

#[cfg(test)]
use mockall::automock;

/// One-way, salted password hashing.
///
/// Both operations are CPU-bound; async callers run them on the blocking
/// pool.
#[cfg_attr(test, automock)]
pub trait PasswordHasher: Send + Sync {
    /// Salted hash of `plain_text` in PHC string form.
    fn hash(&self, plain_text: &str) -> AppResult<String>;

    /// Whether `plain_text` matches `hash`. Constant-time in the content;
    /// a malformed hash never matches.
    fn verify(&self, plain_text: &str, hash: &str) -> bool;
}

/// Argon2id hasher backed by the domain [`Password`] value object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> AppResult<String> {
        Password::hash(plain_text)
            .map(Password::into_string)
            .map_err(AppError::from)
    }

    fn verify(&self, plain_text: &str, hash: &str) -> bool {
        Password::from_hash(hash).verify(plain_text)
    }
}
