//! Authentication primitives: credentials, password hashes and tokens.
//!
//! Constructors validate raw strings before a handler talks to a port or
//! service. Plaintext passwords live in [`Zeroizing`] buffers.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Minimum accepted length of a new password.
pub const PASSWORD_MIN_LEN: usize = 8;
/// Maximum accepted length of a new password.
pub const PASSWORD_MAX_LEN: usize = 120;
/// Maximum accepted length of a password presented at login.
pub const LOGIN_PASSWORD_MAX_LEN: usize = 250;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password was shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort,
    /// Password exceeded the permitted length.
    PasswordTooLong { max: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort => {
                write!(f, "password must be at least {PASSWORD_MIN_LEN} characters")
            }
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Email and password presented at login.
///
/// The email is only trimmed, not validated as an address: an unknown or
/// malformed email must fail exactly like a wrong password.
///
/// # Examples
/// ```
/// use contacts_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "hunter22").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if password.chars().count() > LOGIN_PASSWORD_MAX_LEN {
            return Err(CredentialsValidationError::PasswordTooLong {
                max: LOGIN_PASSWORD_MAX_LEN,
            });
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Plaintext password chosen at signup.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate the length bounds of a new password.
    pub fn new(password: &str) -> Result<Self, CredentialsValidationError> {
        let length = password.chars().count();
        if length < PASSWORD_MIN_LEN {
            return Err(CredentialsValidationError::PasswordTooShort);
        }
        if length > PASSWORD_MAX_LEN {
            return Err(CredentialsValidationError::PasswordTooLong {
                max: PASSWORD_MAX_LEN,
            });
        }
        Ok(Self(Zeroizing::new(password.to_owned())))
    }

    /// Expose the plaintext to a hasher.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(..)")
    }
}

/// Opaque encoded password hash, safe to persist.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Signed bearer credential returned by login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an encoded token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Claims carried by a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Account email the token was issued to.
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
