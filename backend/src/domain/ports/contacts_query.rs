//! Driving port for read-only contact use-cases.

use async_trait::async_trait;

use crate::domain::{Contact, ContactId, ContactSearch, Error, PageRequest};

/// Domain use-case port for reading contacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactsQuery: Send + Sync {
    /// Page through all contacts.
    async fn list(&self, page: PageRequest) -> Result<Vec<Contact>, Error>;

    /// Fetch one contact or fail with `NotFound`.
    async fn get(&self, id: ContactId) -> Result<Contact, Error>;

    /// Contacts matching every provided filter.
    async fn search(&self, search: &ContactSearch) -> Result<Vec<Contact>, Error>;

    /// Contacts whose birthday falls within `days` days from today.
    async fn upcoming_birthdays(&self, days: u32) -> Result<Vec<Contact>, Error>;
}
