//! Contact directory service.
//!
//! Implements the driving ports for contacts and accounts on top of the
//! driven ports for storage, hashing, tokens, mail and avatars. Verification
//! mail is dispatched on a detached task: a delivery failure is logged and
//! never fails the signup that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountAuth, AvatarStore, AvatarStoreError, AvatarUpload, ContactRepository,
    ContactRepositoryError, ContactsCommand, ContactsQuery, PasswordHasher, SignupRequest,
    StoredCredentials, TokenService, VerificationEmail, VerificationMailer,
};
use crate::domain::{
    AccessToken, BirthdayWindow, Contact, ContactId, ContactPatch, ContactSearch, EmailAddress,
    Error, LoginCredentials, NewContact, NewPassword, PageRequest, PasswordHash, TraceId,
    VerificationToken, gravatar_url,
};

pub(crate) const CONTACT_NOT_FOUND: &str = "Contact not found";
pub(crate) const CONTACT_EXISTS: &str = "Contact already exists";
pub(crate) const BAD_CREDENTIALS: &str = "Incorrect email or password";
pub(crate) const INVALID_BEARER: &str = "Could not validate credentials";
pub(crate) const VERIFICATION_FAILED: &str = "Verification failed";
pub(crate) const ALREADY_VERIFIED: &str = "Email already verified";
pub(crate) const NOT_OWNER: &str = "Not allowed to modify another contact";

/// Collaborators the directory service delegates side effects to.
#[derive(Clone)]
pub struct DirectoryCollaborators {
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub mailer: Arc<dyn VerificationMailer>,
    pub avatars: Arc<dyn AvatarStore>,
    pub clock: Arc<dyn Clock>,
}

/// Contact directory service implementing the driving ports.
#[derive(Clone)]
pub struct ContactDirectoryService<R> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    mailer: Arc<dyn VerificationMailer>,
    avatars: Arc<dyn AvatarStore>,
    clock: Arc<dyn Clock>,
}

impl<R> ContactDirectoryService<R> {
    /// Create a new service over `repo`.
    pub fn new(repo: Arc<R>, collaborators: DirectoryCollaborators) -> Self {
        let DirectoryCollaborators {
            hasher,
            tokens,
            mailer,
            avatars,
            clock,
        } = collaborators;
        Self {
            repo,
            hasher,
            tokens,
            mailer,
            avatars,
            clock,
        }
    }
}

impl<R> ContactDirectoryService<R> {
    /// Hash on the blocking pool so key stretching never stalls the executor.
    async fn hash_password(&self, password: NewPassword) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|error| Error::internal(format!("password hashing task failed: {error}")))?
            .map_err(|error| Error::internal(error.to_string()))
    }

    async fn verify_password(
        &self,
        password: Zeroizing<String>,
        hash: PasswordHash,
    ) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(password.as_str(), &hash))
            .await
            .map_err(|error| Error::internal(format!("password check task failed: {error}")))
    }
}

fn map_repository_error(error: ContactRepositoryError) -> Error {
    match error {
        ContactRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("contact store unavailable: {message}"))
        }
        ContactRepositoryError::Query { message } => {
            Error::internal(format!("contact store error: {message}"))
        }
        ContactRepositoryError::DuplicateEmail => Error::conflict(CONTACT_EXISTS),
    }
}

fn map_avatar_error(error: AvatarStoreError) -> Error {
    match error {
        AvatarStoreError::Unconfigured => {
            Error::service_unavailable("Avatar uploads are not available")
        }
        AvatarStoreError::Rejected { message } => {
            debug!(%message, "image host rejected avatar");
            Error::invalid_request("Image host rejected the upload")
        }
        AvatarStoreError::Transport { message } => {
            warn!(%message, "image host request failed");
            Error::service_unavailable("Image host unavailable")
        }
    }
}

impl<R> ContactDirectoryService<R>
where
    R: ContactRepository,
{
    async fn require_contact(&self, id: ContactId) -> Result<Contact, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(CONTACT_NOT_FOUND))
    }

    /// A missing target is reported before an ownership mismatch.
    async fn ensure_owner(&self, actor: &Contact, id: ContactId) -> Result<(), Error> {
        self.require_contact(id).await?;
        if actor.id != id {
            debug!(actor = %actor.id, target = %id, "ownership check failed");
            return Err(Error::forbidden(NOT_OWNER));
        }
        Ok(())
    }

    fn dispatch_verification(&self, contact: &Contact) {
        let Some(token) = contact.verification_token() else {
            return;
        };
        let email = VerificationEmail {
            recipient: contact.email.clone(),
            first_name: contact.first_name.clone(),
            token: token.clone(),
        };
        let mailer = Arc::clone(&self.mailer);
        let contact_id = contact.id;
        let delivery = async move {
            match mailer.send_verification(email).await {
                Ok(()) => debug!(%contact_id, "verification email sent"),
                Err(error) => warn!(%contact_id, %error, "verification email not sent"),
            }
        };
        match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, delivery)),
            None => tokio::spawn(delivery),
        };
    }
}

#[async_trait]
impl<R> ContactsQuery for ContactDirectoryService<R>
where
    R: ContactRepository,
{
    async fn list(&self, page: PageRequest) -> Result<Vec<Contact>, Error> {
        self.repo.list(page).await.map_err(map_repository_error)
    }

    async fn get(&self, id: ContactId) -> Result<Contact, Error> {
        self.require_contact(id).await
    }

    async fn search(&self, search: &ContactSearch) -> Result<Vec<Contact>, Error> {
        self.repo.search(search).await.map_err(map_repository_error)
    }

    async fn upcoming_birthdays(&self, days: u32) -> Result<Vec<Contact>, Error> {
        let today = self.clock.utc().date_naive();
        let window = BirthdayWindow::new(today, days).map_err(|error| {
            Error::invalid_request(error.to_string())
                .with_details(json!({ "field": "days", "code": "out_of_range" }))
        })?;
        self.repo
            .birthdays_within(&window)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R> ContactsCommand for ContactDirectoryService<R>
where
    R: ContactRepository,
{
    async fn signup(&self, request: SignupRequest) -> Result<Contact, Error> {
        let SignupRequest { profile, password } = request;
        let existing = self
            .repo
            .find_by_email(&profile.email)
            .await
            .map_err(map_repository_error)?;
        if existing.is_some() {
            return Err(Error::conflict(CONTACT_EXISTS));
        }

        let password_hash = self.hash_password(password).await?;
        let avatar_url = Some(gravatar_url(&profile.email));
        let contact = self
            .repo
            .create(NewContact {
                profile,
                password_hash,
                avatar_url,
            })
            .await
            .map_err(map_repository_error)?;

        info!(contact_id = %contact.id, "contact signed up");
        self.dispatch_verification(&contact);
        Ok(contact)
    }

    async fn update(
        &self,
        actor: &Contact,
        id: ContactId,
        patch: ContactPatch,
    ) -> Result<Contact, Error> {
        self.ensure_owner(actor, id).await?;
        self.repo
            .update(id, patch)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(CONTACT_NOT_FOUND))
    }

    async fn delete(&self, actor: &Contact, id: ContactId) -> Result<(), Error> {
        self.ensure_owner(actor, id).await?;
        let removed = self.repo.delete(id).await.map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found(CONTACT_NOT_FOUND));
        }
        info!(contact_id = %id, "contact deleted");
        Ok(())
    }

    async fn upload_avatar(
        &self,
        actor: &Contact,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<Contact, Error> {
        let url = self
            .avatars
            .upload(AvatarUpload {
                contact_id: actor.id,
                content_type,
                bytes,
            })
            .await
            .map_err(map_avatar_error)?;
        self.repo
            .set_avatar(actor.id, &url)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(CONTACT_NOT_FOUND))
    }
}

#[async_trait]
impl<R> AccountAuth for ContactDirectoryService<R>
where
    R: ContactRepository,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error> {
        let stored = self
            .repo
            .find_credentials(credentials.email())
            .await
            .map_err(map_repository_error)?;
        let Some(StoredCredentials {
            contact,
            password_hash,
        }) = stored
        else {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        };
        let password = Zeroizing::new(credentials.password().to_owned());
        if !self.verify_password(password, password_hash).await? {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }
        if !contact.is_verified() {
            debug!(contact_id = %contact.id, "login refused before email verification");
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }

        self.tokens
            .issue(&contact.email)
            .map_err(|error| Error::internal(error.to_string()))
    }

    async fn verify_email(&self, token: &VerificationToken) -> Result<(), Error> {
        let contact = self
            .repo
            .find_by_verification_token(token)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::invalid_request(VERIFICATION_FAILED))?;
        if contact.is_verified() {
            return Err(Error::invalid_request(ALREADY_VERIFIED));
        }

        self.repo
            .mark_verified(&contact.email)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::invalid_request(VERIFICATION_FAILED))?;
        info!(contact_id = %contact.id, "email verified");
        Ok(())
    }

    async fn authenticate(&self, bearer: &str) -> Result<Contact, Error> {
        let claims = self.tokens.validate(bearer).map_err(|error| {
            debug!(%error, "bearer token rejected");
            Error::unauthorized(INVALID_BEARER)
        })?;
        let email =
            EmailAddress::new(&claims.subject).map_err(|_| Error::unauthorized(INVALID_BEARER))?;
        self.repo
            .find_by_email(&email)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_BEARER))
    }
}

#[cfg(test)]
#[path = "directory_service_tests.rs"]
mod tests;
