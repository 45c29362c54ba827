//! Process-local `ContactRepository` used when no database is configured.
//!
//! State lives behind a mutex in a `BTreeMap` keyed by id so iteration order
//! matches the id ordering the PostgreSQL adapter returns. Nothing survives a
//! restart.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{ContactRepository, ContactRepositoryError, StoredCredentials};
use crate::domain::{
    BirthdayWindow, Contact, ContactId, ContactPatch, ContactSearch, EmailAddress, NewContact,
    PageRequest, VerificationState, VerificationToken,
};

#[derive(Default)]
struct Store {
    next_id: i32,
    rows: BTreeMap<i32, StoredCredentials>,
}

/// In-memory implementation of the `ContactRepository` port.
#[derive(Clone)]
pub struct InMemoryContactRepository {
    store: Arc<Mutex<Store>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryContactRepository {
    /// Create an empty repository stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, ContactRepositoryError> {
        self.store
            .lock()
            .map_err(|_| ContactRepositoryError::connection("in-memory store poisoned"))
    }
}

fn contacts_where(store: &Store, predicate: impl Fn(&Contact) -> bool) -> Vec<Contact> {
    store
        .rows
        .values()
        .map(|row| &row.contact)
        .filter(|contact| predicate(contact))
        .cloned()
        .collect()
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list(&self, page: PageRequest) -> Result<Vec<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(store
            .rows
            .values()
            .skip(page.skip() as usize)
            .take(page.limit() as usize)
            .map(|row| row.contact.clone())
            .collect())
    }

    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(store.rows.get(&id.get()).map(|row| row.contact.clone()))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(contacts_where(&store, |contact| &contact.email == email)
            .into_iter()
            .next())
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(store
            .rows
            .values()
            .find(|row| row.contact.email.as_str() == email)
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(
            contacts_where(&store, |contact| contact.verification_token() == Some(token))
                .into_iter()
                .next(),
        )
    }

    async fn search(
        &self,
        search: &ContactSearch,
    ) -> Result<Vec<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(contacts_where(&store, |contact| search.matches(contact)))
    }

    async fn create(&self, contact: NewContact) -> Result<Contact, ContactRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        let email = &contact.profile.email;
        if store.rows.values().any(|row| &row.contact.email == email) {
            return Err(ContactRepositoryError::duplicate_email());
        }
        store.next_id += 1;
        let id = store.next_id;
        let NewContact {
            profile,
            password_hash,
            avatar_url,
        } = contact;
        let created = Contact {
            id: ContactId::new(id),
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            phone: profile.phone,
            birth_day: profile.birth_day,
            data: profile.data,
            avatar_url,
            verification: VerificationState::Pending(VerificationToken::random()),
            created_at: now,
            updated_at: now,
        };
        store.rows.insert(
            id,
            StoredCredentials {
                contact: created.clone(),
                password_hash,
            },
        );
        Ok(created)
    }

    async fn update(
        &self,
        id: ContactId,
        patch: ContactPatch,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        Ok(store.rows.get_mut(&id.get()).map(|row| {
            patch.apply_to(&mut row.contact, now);
            row.contact.clone()
        }))
    }

    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        let mut store = self.lock()?;
        Ok(store.rows.remove(&id.get()).is_some())
    }

    async fn birthdays_within(
        &self,
        window: &BirthdayWindow,
    ) -> Result<Vec<Contact>, ContactRepositoryError> {
        let store = self.lock()?;
        Ok(contacts_where(&store, |contact| {
            window.contains(contact.birth_day)
        }))
    }

    async fn mark_verified(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        Ok(store
            .rows
            .values_mut()
            .find(|row| &row.contact.email == email)
            .map(|row| {
                row.contact.verification = VerificationState::Verified;
                row.contact.updated_at = now;
                row.contact.clone()
            }))
    }

    async fn set_avatar(
        &self,
        id: ContactId,
        url: &str,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock()?;
        Ok(store.rows.get_mut(&id.get()).map(|row| {
            row.contact.avatar_url = Some(url.to_owned());
            row.contact.updated_at = now;
            row.contact.clone()
        }))
    }
}
