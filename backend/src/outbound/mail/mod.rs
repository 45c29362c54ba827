//! Outbound mail adapters for account verification.

mod smtp_mailer;
mod template;

pub use smtp_mailer::{DisabledVerificationMailer, SmtpMailerConfig, SmtpVerificationMailer};
pub use template::{VERIFICATION_SUBJECT, verification_link};
