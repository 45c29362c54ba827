//! Port for issuing and validating bearer tokens.

use crate::domain::{AccessToken, EmailAddress, TokenClaims};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenServiceError {
        /// Signing the token failed.
        Encoding { message: String } => "token encoding failed: {message}",
        /// Token was malformed or carried a bad signature.
        Invalid { message: String } => "token rejected: {message}",
        /// Token expiry has passed.
        Expired => "token expired",
    }
}

/// Signed, tamper-evident bearer tokens bound to an account email.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Issue a token for `subject` using the configured expiry.
    fn issue(&self, subject: &EmailAddress) -> Result<AccessToken, TokenServiceError>;

    /// Verify signature and expiry, returning the embedded claims.
    fn validate(&self, token: &str) -> Result<TokenClaims, TokenServiceError>;
}
