//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed contact and account types plus the
//! directory service that enforces the business rules. Nothing here knows
//! about HTTP, SQL, SMTP or the image host; those live behind [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Contact and its validated field types.
//! - BirthdayWindow, ContactSearch, PageRequest: query criteria.
//! - ContactDirectoryService: implementation of the driving ports.

pub mod auth;
pub mod avatar;
pub mod birthday;
pub mod contact;
pub mod directory_service;
pub mod error;
pub mod ports;
pub mod search;
pub mod trace_id;

pub use self::auth::{
    AccessToken, CredentialsValidationError, LoginCredentials, NewPassword, PasswordHash,
    TokenClaims,
};
pub use self::avatar::gravatar_url;
pub use self::birthday::{BirthdayWindow, BirthdayWindowError, DEFAULT_WINDOW_DAYS, MonthDay};
pub use self::contact::{
    Contact, ContactData, ContactId, ContactPatch, ContactProfile, ContactValidationError,
    EmailAddress, NewContact, PersonName, PhoneNumber, VerificationState, VerificationToken,
};
pub use self::directory_service::{ContactDirectoryService, DirectoryCollaborators};
pub use self::error::{Error, ErrorCode};
pub use self::search::{ContactSearch, PageRequest, QueryValidationError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
