//! SMTP delivery of verification emails via `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ports::{MailerError, VerificationEmail, VerificationMailer};

use super::template::{VERIFICATION_SUBJECT, render_verification_body, verification_link};

/// Connection and sender settings for the SMTP relay.
#[derive(Clone)]
pub struct SmtpMailerConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: Zeroizing<String>,
    pub from_address: String,
    pub from_name: String,
    pub public_host: Url,
}

/// Sends verification emails over an implicit-TLS SMTP relay.
pub struct SmtpVerificationMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    public_host: Url,
}

impl SmtpVerificationMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError::Message`] when the sender address is invalid
    /// and [`MailerError::Transport`] when the relay cannot be configured.
    pub fn new(config: SmtpMailerConfig) -> Result<Self, MailerError> {
        let address: Address = config
            .from_address
            .parse()
            .map_err(|err: lettre::address::AddressError| MailerError::message(err.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
            .map_err(|err| MailerError::transport(err.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username,
                config.password.as_str().to_owned(),
            ))
            .build();
        Ok(Self {
            transport,
            sender: Mailbox::new(Some(config.from_name), address),
            public_host: config.public_host,
        })
    }

    fn build_message(&self, email: &VerificationEmail) -> Result<Message, MailerError> {
        let recipient: Address = email
            .recipient
            .as_str()
            .parse()
            .map_err(|err: lettre::address::AddressError| MailerError::message(err.to_string()))?;
        let link = verification_link(&self.public_host, &email.token);
        let body = render_verification_body(email.first_name.as_str(), &self.public_host, &link);
        Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(Some(email.first_name.as_str().to_owned()), recipient))
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|err| MailerError::message(err.to_string()))
    }
}

#[async_trait]
impl VerificationMailer for SmtpVerificationMailer {
    async fn send_verification(&self, email: VerificationEmail) -> Result<(), MailerError> {
        let message = self.build_message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|err| MailerError::transport(err.to_string()))?;
        debug!(recipient = %email.recipient, "verification email handed to relay");
        Ok(())
    }
}

/// Mailer used when no SMTP relay is configured; every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledVerificationMailer;

#[async_trait]
impl VerificationMailer for DisabledVerificationMailer {
    async fn send_verification(&self, _email: VerificationEmail) -> Result<(), MailerError> {
        Err(MailerError::unconfigured())
    }
}

#[cfg(test)]
mod tests {
    //! Message construction coverage; delivery needs a live relay.
    use super::*;
    use crate::domain::{EmailAddress, PersonName, VerificationToken};
    use rstest::{fixture, rstest};

    #[fixture]
    fn mailer() -> SmtpVerificationMailer {
        SmtpVerificationMailer::new(SmtpMailerConfig {
            server: "smtp.example.com".to_owned(),
            port: 465,
            username: "mailer".to_owned(),
            password: Zeroizing::new("secret".to_owned()),
            from_address: "noreply@example.com".to_owned(),
            from_name: "Contacts".to_owned(),
            public_host: Url::parse("https://contacts.example.com/").expect("url"),
        })
        .expect("mailer")
    }

    fn email() -> VerificationEmail {
        VerificationEmail {
            recipient: EmailAddress::new("ada@example.com").expect("email"),
            first_name: PersonName::new("Ada").expect("name"),
            token: VerificationToken::new("tok-1"),
        }
    }

    #[rstest]
    fn message_carries_subject_and_link(mailer: SmtpVerificationMailer) {
        let message = mailer.build_message(&email()).expect("message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Subject: Welcome to Contacts"));
        assert!(raw.contains("To: Ada <ada@example.com>"));
        assert!(raw.contains("From: Contacts <noreply@example.com>"));
    }

    #[rstest]
    fn invalid_sender_is_rejected() {
        let result = SmtpVerificationMailer::new(SmtpMailerConfig {
            server: "smtp.example.com".to_owned(),
            port: 465,
            username: "mailer".to_owned(),
            password: Zeroizing::new("secret".to_owned()),
            from_address: "not an address".to_owned(),
            from_name: "Contacts".to_owned(),
            public_host: Url::parse("https://contacts.example.com/").expect("url"),
        });
        assert!(matches!(result, Err(MailerError::Message { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_mailer_reports_unconfigured() {
        let result = DisabledVerificationMailer.send_verification(email()).await;
        assert_eq!(result, Err(MailerError::Unconfigured));
    }
}
