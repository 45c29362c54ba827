//! Driving port for contact mutations.
//!
//! Mutations other than signup act on behalf of an authenticated account and
//! are only permitted on that account's own record.

use async_trait::async_trait;

use crate::domain::{Contact, ContactId, ContactPatch, ContactProfile, Error, NewPassword};

/// Validated signup payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SignupRequest {
    pub profile: ContactProfile,
    pub password: NewPassword,
}

/// Domain use-case port for creating and changing contacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactsCommand: Send + Sync {
    /// Register a new, unverified account.
    async fn signup(&self, request: SignupRequest) -> Result<Contact, Error>;

    /// Apply a partial update to the actor's own record.
    async fn update(
        &self,
        actor: &Contact,
        id: ContactId,
        patch: ContactPatch,
    ) -> Result<Contact, Error>;

    /// Delete the actor's own record.
    async fn delete(&self, actor: &Contact, id: ContactId) -> Result<(), Error>;

    /// Upload a new avatar image for the actor.
    async fn upload_avatar(
        &self,
        actor: &Contact,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<Contact, Error>;
}
