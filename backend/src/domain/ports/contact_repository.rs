//! Port abstraction for contact persistence adapters and their errors.
//!
//! Every mutation commits on its own; adapters offer no cross-call
//! transactions. Email uniqueness is the store's responsibility: an insert
//! that violates it must surface as [`ContactRepositoryError::DuplicateEmail`]
//! even when the caller pre-checked, since the pre-check can race.

use async_trait::async_trait;

use crate::domain::{
    BirthdayWindow, Contact, ContactId, ContactPatch, ContactSearch, EmailAddress, NewContact,
    PageRequest, PasswordHash, VerificationToken,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by contact repository adapters.
    pub enum ContactRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "contact repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "contact repository query failed: {message}",
        /// Insert rejected by the unique email constraint.
        DuplicateEmail => "a contact with this email already exists",
    }
}

/// A contact together with its stored password hash.
///
/// Only the login flow reads this; every other lookup returns a bare
/// [`Contact`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredentials {
    pub contact: Contact,
    pub password_hash: PasswordHash,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Page through contacts ordered by id.
    async fn list(&self, page: PageRequest) -> Result<Vec<Contact>, ContactRepositoryError>;

    /// Fetch a contact by identifier.
    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Fetch a contact by its exact email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Fetch a contact and its password hash by raw login email.
    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, ContactRepositoryError>;

    /// Fetch the unverified contact holding `token`.
    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Contacts matching every filter in `search`, ordered by id.
    async fn search(&self, search: &ContactSearch)
    -> Result<Vec<Contact>, ContactRepositoryError>;

    /// Insert a contact, assigning id, timestamps and a fresh verification
    /// token.
    async fn create(&self, contact: NewContact) -> Result<Contact, ContactRepositoryError>;

    /// Apply the present fields of `patch` and refresh `updated_at`.
    async fn update(
        &self,
        id: ContactId,
        patch: ContactPatch,
    ) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Remove a contact; `false` when nothing matched.
    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError>;

    /// Contacts whose birthday falls inside `window`, ordered by id.
    async fn birthdays_within(
        &self,
        window: &BirthdayWindow,
    ) -> Result<Vec<Contact>, ContactRepositoryError>;

    /// Mark the account verified and clear its token.
    async fn mark_verified(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError>;

    /// Replace the avatar URL only.
    async fn set_avatar(
        &self,
        id: ContactId,
        url: &str,
    ) -> Result<Option<Contact>, ContactRepositoryError>;
}
