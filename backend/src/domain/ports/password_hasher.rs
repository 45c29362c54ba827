//! Port for one-way password hashing.

use crate::domain::{NewPassword, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing a password.
    pub enum PasswordHashError {
        /// The hashing primitive failed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Salted one-way password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a new password with a fresh salt.
    fn hash(&self, password: &NewPassword) -> Result<PasswordHash, PasswordHashError>;

    /// Check `password` against a stored hash. Malformed hashes never match.
    fn verify(&self, password: &str, hash: &PasswordHash) -> bool;
}

/// Reversible stand-in hasher for tests and local fixtures.
///
/// Never wire this into a server: the "hash" embeds the plaintext.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

const FIXTURE_PREFIX: &str = "fixture$";

impl PasswordHasher for FixturePasswordHasher {
    fn hash(&self, password: &NewPassword) -> Result<PasswordHash, PasswordHashError> {
        Ok(PasswordHash::new(format!(
            "{FIXTURE_PREFIX}{}",
            password.expose().chars().rev().collect::<String>()
        )))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> bool {
        hash.as_str()
            .strip_prefix(FIXTURE_PREFIX)
            .is_some_and(|reversed| reversed.chars().rev().eq(password.chars()))
    }
}
