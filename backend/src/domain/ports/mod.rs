//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_auth;
mod avatar_store;
mod contact_repository;
mod contacts_command;
mod contacts_query;
mod password_hasher;
mod token_service;
mod verification_mailer;

pub use account_auth::AccountAuth;
#[cfg(test)]
pub use account_auth::MockAccountAuth;
pub use avatar_store::{AvatarStore, AvatarStoreError, AvatarUpload};
#[cfg(test)]
pub use avatar_store::MockAvatarStore;
pub use contact_repository::{ContactRepository, ContactRepositoryError, StoredCredentials};
#[cfg(test)]
pub use contact_repository::MockContactRepository;
pub use contacts_command::{ContactsCommand, SignupRequest};
#[cfg(test)]
pub use contacts_command::MockContactsCommand;
pub use contacts_query::ContactsQuery;
#[cfg(test)]
pub use contacts_query::MockContactsQuery;
pub use password_hasher::{FixturePasswordHasher, PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use token_service::{TokenService, TokenServiceError};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use verification_mailer::{MailerError, VerificationEmail, VerificationMailer};
#[cfg(test)]
pub use verification_mailer::MockVerificationMailer;
