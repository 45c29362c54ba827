//! Port for delivering account verification emails.

use async_trait::async_trait;

use crate::domain::{EmailAddress, PersonName, VerificationToken};

use super::define_port_error;

/// Everything an adapter needs to render the verification message.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationEmail {
    pub recipient: EmailAddress,
    pub first_name: PersonName,
    pub token: VerificationToken,
}

define_port_error! {
    /// Errors raised by mail adapters.
    pub enum MailerError {
        /// No mail transport is configured.
        Unconfigured => "mail delivery is not configured",
        /// The message could not be assembled.
        Message { message: String } => "verification email could not be built: {message}",
        /// The transport refused or failed to deliver the message.
        Transport { message: String } => "mail transport failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    /// Deliver a verification message.
    async fn send_verification(&self, email: VerificationEmail) -> Result<(), MailerError>;
}
