//! PostgreSQL-backed `ContactRepository` implementation using Diesel ORM.
//!
//! Rows are decoded into validated domain types on the way out; a row that
//! fails validation is reported as a query error rather than silently
//! dropped. Birthday lookups compare `to_char(birth_day, 'MM-DD')` against
//! the window's month/day keys so the year never participates.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Date, Text};
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{ContactRepository, ContactRepositoryError, StoredCredentials};
use crate::domain::{
    BirthdayWindow, Contact, ContactData, ContactId, ContactPatch, ContactSearch, EmailAddress,
    NewContact, PageRequest, PasswordHash, PersonName, PhoneNumber, VerificationState,
    VerificationToken,
};

use super::models::{ContactChangeset, ContactRow, CredentialsRow, NewContactRow};
use super::pool::{DbPool, PoolError};
use super::schema::contacts;

diesel::define_sql_function! {
    /// PostgreSQL `to_char` for dates.
    fn to_char(value: Date, format: Text) -> Text;
}

const MONTH_DAY_FORMAT: &str = "MM-DD";

/// Diesel-backed implementation of the `ContactRepository` port.
#[derive(Clone)]
pub struct DieselContactRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselContactRepository {
    /// Create a repository over `pool`, stamping writes with `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> ContactRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ContactRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ContactRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ContactRepositoryError::duplicate_email()
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ContactRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => ContactRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => ContactRepositoryError::query("database query error"),
        _ => ContactRepositoryError::query("database error"),
    }
}

fn corrupt_row(id: i32, field: &str) -> ContactRepositoryError {
    warn!(contact_id = id, field, "stored contact failed validation");
    ContactRepositoryError::query(format!("stored contact {id} has an invalid {field}"))
}

/// Convert a database row to a domain contact.
fn row_to_contact(row: ContactRow) -> Result<Contact, ContactRepositoryError> {
    let id = row.id;
    let data = row
        .data
        .map(ContactData::try_from)
        .transpose()
        .map_err(|_| corrupt_row(id, "data"))?;
    let verification = VerificationState::from_columns(row.verified, row.verification_token)
        .ok_or_else(|| corrupt_row(id, "verification state"))?;
    Ok(Contact {
        id: ContactId::new(id),
        first_name: PersonName::new(&row.first_name).map_err(|_| corrupt_row(id, "first_name"))?,
        last_name: PersonName::new(&row.last_name).map_err(|_| corrupt_row(id, "last_name"))?,
        email: EmailAddress::new(&row.email).map_err(|_| corrupt_row(id, "email"))?,
        phone: PhoneNumber::new(&row.phone).map_err(|_| corrupt_row(id, "phone"))?,
        birth_day: row.birth_day,
        data,
        avatar_url: row.avatar_url,
        verification,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_contacts(rows: Vec<ContactRow>) -> Result<Vec<Contact>, ContactRepositoryError> {
    rows.into_iter().map(row_to_contact).collect()
}

#[async_trait]
impl ContactRepository for DieselContactRepository {
    async fn list(&self, page: PageRequest) -> Result<Vec<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ContactRow> = contacts::table
            .order(contacts::id.asc())
            .offset(i64::from(page.skip()))
            .limit(i64::from(page.limit()))
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_contacts(rows)
    }

    async fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        contacts::table
            .find(id.get())
            .select(ContactRow::as_select())
            .first::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        contacts::table
            .filter(contacts::email.eq(email.as_str()))
            .select(ContactRow::as_select())
            .first::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = contacts::table
            .filter(contacts::email.eq(email))
            .select(CredentialsRow::as_select())
            .first::<CredentialsRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            Ok(StoredCredentials {
                contact: row_to_contact(row.contact)?,
                password_hash: PasswordHash::new(row.password_hash),
            })
        })
        .transpose()
    }

    async fn find_by_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        contacts::table
            .filter(contacts::verification_token.eq(token.as_str()))
            .select(ContactRow::as_select())
            .first::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }

    async fn search(
        &self,
        search: &ContactSearch,
    ) -> Result<Vec<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = contacts::table
            .select(ContactRow::as_select())
            .order(contacts::id.asc())
            .into_boxed();
        if let Some(first_name) = search.first_name() {
            query = query.filter(contacts::first_name.eq(first_name));
        }
        if let Some(last_name) = search.last_name() {
            query = query.filter(contacts::last_name.eq(last_name));
        }
        if let Some(email) = search.email() {
            query = query.filter(contacts::email.eq(email));
        }
        let rows: Vec<ContactRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows_to_contacts(rows)
    }

    async fn create(&self, contact: NewContact) -> Result<Contact, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let token = VerificationToken::random();
        let now = self.clock.utc();
        let profile = &contact.profile;
        let row = NewContactRow {
            first_name: profile.first_name.as_str(),
            last_name: profile.last_name.as_str(),
            email: profile.email.as_str(),
            phone: profile.phone.as_str(),
            birth_day: profile.birth_day,
            data: profile.data.clone().map(ContactData::into_value),
            password_hash: contact.password_hash.as_str(),
            avatar_url: contact.avatar_url.as_deref(),
            verified: false,
            verification_token: Some(token.as_str()),
            created_at: now,
            updated_at: now,
        };
        let inserted: ContactRow = diesel::insert_into(contacts::table)
            .values(&row)
            .returning(ContactRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_contact(inserted)
    }

    async fn update(
        &self,
        id: ContactId,
        patch: ContactPatch,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = ContactChangeset {
            first_name: patch.first_name.as_ref().map(PersonName::as_str),
            last_name: patch.last_name.as_ref().map(PersonName::as_str),
            phone: patch.phone.as_ref().map(PhoneNumber::as_str),
            birth_day: patch.birth_day,
            data: patch.data.clone().map(ContactData::into_value),
            updated_at: self.clock.utc(),
        };
        diesel::update(contacts::table.find(id.get()))
            .set(&changeset)
            .returning(ContactRow::as_returning())
            .get_result::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }

    async fn delete(&self, id: ContactId) -> Result<bool, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(contacts::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn birthdays_within(
        &self,
        window: &BirthdayWindow,
    ) -> Result<Vec<Contact>, ContactRepositoryError> {
        let keys: Vec<String> = window
            .month_days()
            .iter()
            .map(ToString::to_string)
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ContactRow> = contacts::table
            .filter(to_char(contacts::birth_day, MONTH_DAY_FORMAT).eq_any(keys))
            .order(contacts::id.asc())
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_contacts(rows)
    }

    async fn mark_verified(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(contacts::table.filter(contacts::email.eq(email.as_str())))
            .set((
                contacts::verified.eq(true),
                contacts::verification_token.eq(None::<String>),
                contacts::updated_at.eq(self.clock.utc()),
            ))
            .returning(ContactRow::as_returning())
            .get_result::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }

    async fn set_avatar(
        &self,
        id: ContactId,
        url: &str,
    ) -> Result<Option<Contact>, ContactRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(contacts::table.find(id.get()))
            .set((
                contacts::avatar_url.eq(Some(url)),
                contacts::updated_at.eq(self.clock.utc()),
            ))
            .returning(ContactRow::as_returning())
            .get_result::<ContactRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_contact)
            .transpose()
    }
}
