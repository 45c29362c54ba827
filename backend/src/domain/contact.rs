//! Contact aggregate and its validated field types.
//!
//! A contact doubles as the account entity: it owns the login email, the
//! verification lifecycle and the avatar. The stored password hash is not
//! part of this type so no representation derived from it can leak it.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Maximum length of a first or last name, in characters.
pub const NAME_MAX_LEN: usize = 50;
/// Maximum length of an email address, in characters.
pub const EMAIL_MAX_LEN: usize = 120;
/// Maximum length of a phone number, in characters.
pub const PHONE_MAX_LEN: usize = 12;

/// Validation failures raised by the contact field constructors.
///
/// Variants carry no field name; inbound adapters attach the payload field
/// they were parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactValidationError {
    /// Name was blank once trimmed.
    #[error("name must not be empty")]
    EmptyName,
    /// Name exceeded [`NAME_MAX_LEN`].
    #[error("name must be at most {NAME_MAX_LEN} characters")]
    NameTooLong,
    /// Email was not a plausible `local@domain` address.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Email exceeded [`EMAIL_MAX_LEN`].
    #[error("email must be at most {EMAIL_MAX_LEN} characters")]
    EmailTooLong,
    /// Phone was blank once trimmed.
    #[error("phone must not be empty")]
    EmptyPhone,
    /// Phone exceeded [`PHONE_MAX_LEN`].
    #[error("phone must be at most {PHONE_MAX_LEN} characters")]
    PhoneTooLong,
    /// Free-form data was not a JSON object.
    #[error("data must be a JSON object")]
    DataNotObject,
}

impl ContactValidationError {
    /// Stable machine-readable code for adapters.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::EmptyPhone => "empty",
            Self::NameTooLong | Self::EmailTooLong | Self::PhoneTooLong => "too_long",
            Self::InvalidEmail => "invalid_email",
            Self::DataNotObject => "not_an_object",
        }
    }
}

/// Database-assigned contact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(i32);

impl ContactId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn bounded(value: &str, max: usize) -> Option<String> {
    let trimmed = value.trim();
    (trimmed.chars().count() <= max).then(|| trimmed.to_owned())
}

/// A first or last name: trimmed, non-empty, at most [`NAME_MAX_LEN`] chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Validate and normalise a name.
    pub fn new(value: &str) -> Result<Self, ContactValidationError> {
        let name = bounded(value, NAME_MAX_LEN).ok_or(ContactValidationError::NameTooLong)?;
        if name.is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Login and contact email address.
///
/// Matching is case-sensitive; the address is stored as given apart from
/// surrounding whitespace.
///
/// # Examples
/// ```
/// use contacts_backend::domain::EmailAddress;
///
/// let email = EmailAddress::new(" ada@example.com ").expect("valid email");
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert!(EmailAddress::new("not-an-email").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate an email address.
    pub fn new(value: &str) -> Result<Self, ContactValidationError> {
        let email = bounded(value, EMAIL_MAX_LEN).ok_or(ContactValidationError::EmailTooLong)?;
        let mut parts = email.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None)
                if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        );
        if !well_formed {
            return Err(ContactValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }

    /// Borrow the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contact phone number, at most [`PHONE_MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a phone number.
    pub fn new(value: &str) -> Result<Self, ContactValidationError> {
        let phone = bounded(value, PHONE_MAX_LEN).ok_or(ContactValidationError::PhoneTooLong)?;
        if phone.is_empty() {
            return Err(ContactValidationError::EmptyPhone);
        }
        Ok(Self(phone))
    }

    /// Borrow the number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-form key/value metadata attached to a contact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactData(Map<String, Value>);

impl ContactData {
    /// Convert into a JSON value for storage or transport.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for ContactData {
    type Error = ContactValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ContactValidationError::DataNotObject),
        }
    }
}

/// Single-use opaque credential proving control of an email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a token received from a client or read from storage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Email verification lifecycle.
///
/// A pending account always has a token; a verified one never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    /// Awaiting confirmation with the given token.
    Pending(VerificationToken),
    /// Email ownership confirmed.
    Verified,
}

impl VerificationState {
    /// Rebuild the state from its stored columns.
    ///
    /// A verified flag wins over a stale token; an unverified row without a
    /// token is reported as `None` so callers can treat it as corrupt.
    pub fn from_columns(verified: bool, token: Option<String>) -> Option<Self> {
        match (verified, token) {
            (true, _) => Some(Self::Verified),
            (false, Some(token)) => Some(Self::Pending(VerificationToken::new(token))),
            (false, None) => None,
        }
    }
}

/// Stored contact record.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub birth_day: NaiveDate,
    pub data: Option<ContactData>,
    pub avatar_url: Option<String>,
    pub verification: VerificationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Whether the email address has been confirmed.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self.verification, VerificationState::Verified)
    }

    /// Outstanding verification token, present only while unverified.
    #[must_use]
    pub fn verification_token(&self) -> Option<&VerificationToken> {
        match &self.verification {
            VerificationState::Pending(token) => Some(token),
            VerificationState::Verified => None,
        }
    }
}

/// Profile fields supplied at signup.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactProfile {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub birth_day: NaiveDate,
    pub data: Option<ContactData>,
}

/// Fully prepared record handed to the store for insertion.
///
/// The store assigns the id, timestamps and verification token.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub profile: ContactProfile,
    pub password_hash: super::PasswordHash,
    pub avatar_url: Option<String>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactPatch {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub phone: Option<PhoneNumber>,
    pub birth_day: Option<NaiveDate>,
    pub data: Option<ContactData>,
}

impl ContactPatch {
    /// Apply present fields to `contact` and stamp `updated_at`.
    pub fn apply_to(self, contact: &mut Contact, now: DateTime<Utc>) {
        if let Some(first_name) = self.first_name {
            contact.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            contact.last_name = last_name;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if let Some(birth_day) = self.birth_day {
            contact.birth_day = birth_day;
        }
        if let Some(data) = self.data {
            contact.data = Some(data);
        }
        contact.updated_at = now;
    }
}
