//! Driving port for login, bearer authentication and email verification.
//!
//! Inbound adapters call it without knowing which hasher, token format or
//! store sits behind it, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{AccessToken, Contact, Error, LoginCredentials, VerificationToken};

/// Domain use-case port for account authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountAuth: Send + Sync {
    /// Exchange valid credentials of a verified account for a bearer token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error>;

    /// Consume a verification token.
    async fn verify_email(&self, token: &VerificationToken) -> Result<(), Error>;

    /// Resolve a bearer token to the account it was issued to.
    async fn authenticate(&self, bearer: &str) -> Result<Contact, Error>;
}
