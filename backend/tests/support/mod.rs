//! Shared harness for backend integration tests.
//!
//! Builds the full `/api` scope over the in-memory store with a fixed clock,
//! the reversible fixture hasher and a mailer that records outgoing
//! verification emails instead of sending them.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use actix_web::web;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use jsonwebtoken::Algorithm;
use mockable::Clock;

use contacts_backend::domain::ports::{
    FixturePasswordHasher, MailerError, VerificationEmail, VerificationMailer,
};
use contacts_backend::domain::{ContactDirectoryService, DirectoryCollaborators};
use contacts_backend::inbound::http::state::HttpState;
use contacts_backend::middleware::EndpointLimits;
use contacts_backend::outbound::avatar::UnconfiguredAvatarStore;
use contacts_backend::outbound::persistence::InMemoryContactRepository;
use contacts_backend::outbound::security::JwtTokenService;

/// Clock pinned to a single instant.
pub struct FixtureClock(pub DateTime<Utc>);

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 2024-01-28 at noon UTC.
pub fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 28, 12, 0, 0)
        .single()
        .expect("valid stamp")
}

/// Mailer that keeps every message in memory.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<VerificationEmail>>>,
}

impl RecordingMailer {
    /// Wait for the detached dispatch task to deliver mail to `email`,
    /// returning its verification token.
    pub async fn token_for(&self, email: &str) -> String {
        for _ in 0..100 {
            let found = self
                .sent
                .lock()
                .expect("mailer lock")
                .iter()
                .rev()
                .find(|message| message.recipient.as_str() == email)
                .map(|message| message.token.as_str().to_owned());
            if let Some(token) = found {
                return token;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!("no verification email sent to {email}");
    }
}

#[async_trait]
impl VerificationMailer for RecordingMailer {
    async fn send_verification(&self, email: VerificationEmail) -> Result<(), MailerError> {
        self.sent.lock().expect("mailer lock").push(email);
        Ok(())
    }
}

/// Collaborators and state for one test application.
pub struct Harness {
    pub state: web::Data<HttpState>,
    pub mailer: RecordingMailer,
}

impl Harness {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock(today()));
        let mailer = RecordingMailer::default();
        let service = ContactDirectoryService::new(
            Arc::new(InMemoryContactRepository::new(clock.clone())),
            DirectoryCollaborators {
                hasher: Arc::new(FixturePasswordHasher),
                tokens: Arc::new(JwtTokenService::new(
                    b"integration-secret",
                    Algorithm::HS256,
                    Duration::hours(1),
                    clock.clone(),
                )),
                mailer: Arc::new(mailer.clone()),
                avatars: Arc::new(UnconfiguredAvatarStore),
                clock,
            },
        );
        Self {
            state: web::Data::new(HttpState::from_service(Arc::new(service))),
            mailer,
        }
    }

    /// Endpoint limiters allowing `per_minute` requests per client each.
    pub fn limiter(per_minute: u32) -> EndpointLimits {
        EndpointLimits::per_minute(NonZeroU32::new(per_minute).expect("non-zero"))
    }
}

/// Initialise the full `/api` scope for `$harness`.
macro_rules! init_app {
    ($harness:expr, $per_minute:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($harness.state.clone())
                .wrap(contacts_backend::Trace)
                .service(actix_web::web::scope("/api").configure(
                    contacts_backend::inbound::http::routes::configure(
                        $crate::support::Harness::limiter($per_minute),
                    ),
                )),
        )
        .await
    };
}
