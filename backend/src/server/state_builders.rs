//! Builders wiring configured adapters into the HTTP state.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use contacts_backend::config::AppConfig;
use contacts_backend::domain::ports::{AvatarStore, ContactRepository, VerificationMailer};
use contacts_backend::domain::{ContactDirectoryService, DirectoryCollaborators};
use contacts_backend::inbound::http::state::HttpState;
use contacts_backend::outbound::avatar::{
    CloudinaryAvatarStore, CloudinaryCredentials, UnconfiguredAvatarStore,
};
use contacts_backend::outbound::mail::{
    DisabledVerificationMailer, SmtpMailerConfig, SmtpVerificationMailer,
};
use contacts_backend::outbound::persistence::{
    DbPool, DieselContactRepository, InMemoryContactRepository, run_pending_migrations,
};
use contacts_backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};

fn state_for<R>(repo: Arc<R>, collaborators: DirectoryCollaborators) -> HttpState
where
    R: ContactRepository + 'static,
{
    HttpState::from_service(Arc::new(ContactDirectoryService::new(repo, collaborators)))
}

fn build_mailer(config: Option<&SmtpMailerConfig>) -> std::io::Result<Arc<dyn VerificationMailer>> {
    match config {
        Some(config) => {
            let mailer = SmtpVerificationMailer::new(config.clone())
                .map_err(|err| std::io::Error::other(format!("mailer setup failed: {err}")))?;
            info!(server = %config.server, port = config.port, "smtp mailer configured");
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("mail server not configured; verification emails will be skipped");
            Ok(Arc::new(DisabledVerificationMailer))
        }
    }
}

fn build_avatar_store(
    credentials: Option<&CloudinaryCredentials>,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn AvatarStore>> {
    match credentials {
        Some(credentials) => {
            let store = CloudinaryAvatarStore::new(credentials.clone(), clock).map_err(|err| {
                std::io::Error::other(format!("image host setup failed: {err}"))
            })?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("image host not configured; avatar uploads will answer 503");
            Ok(Arc::new(UnconfiguredAvatarStore))
        }
    }
}

fn build_collaborators(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<DirectoryCollaborators> {
    Ok(DirectoryCollaborators {
        hasher: Arc::new(Argon2PasswordHasher),
        tokens: Arc::new(JwtTokenService::new(
            &config.jwt.secret,
            config.jwt.algorithm,
            config.jwt.ttl,
            clock.clone(),
        )),
        mailer: build_mailer(config.mail.as_ref())?,
        avatars: build_avatar_store(config.cloudinary.as_ref(), clock.clone())?,
        clock,
    })
}

/// Build the HTTP state for `config`.
///
/// With a database URL, pending migrations are applied and the Diesel
/// repository is used; otherwise contacts live in memory for the lifetime
/// of the process.
///
/// # Errors
///
/// Returns [`std::io::Error`] when migrations, the pool or an outbound
/// adapter cannot be set up.
pub(crate) async fn build_http_state(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<HttpState> {
    let collaborators = build_collaborators(config, clock.clone())?;
    match &config.database {
        Some(pool_config) => {
            run_pending_migrations(pool_config.database_url())
                .await
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            let pool = DbPool::new(pool_config.clone())
                .await
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            Ok(state_for(
                Arc::new(DieselContactRepository::new(pool, clock)),
                collaborators,
            ))
        }
        None => {
            warn!("database url not configured; contacts are kept in memory");
            Ok(state_for(
                Arc::new(InMemoryContactRepository::new(clock)),
                collaborators,
            ))
        }
    }
}

/// In-memory configuration with no outbound services.
#[cfg(test)]
pub(crate) fn test_app_config() -> AppConfig {
    use std::num::NonZeroU32;

    use chrono::Duration;
    use contacts_backend::config::JwtConfig;
    use jsonwebtoken::Algorithm;
    use url::Url;
    use zeroize::Zeroizing;

    AppConfig {
        database: None,
        bind_addr: "127.0.0.1:0".parse().expect("socket address"),
        jwt: JwtConfig {
            secret: Zeroizing::new(b"state-builder-secret".to_vec()),
            algorithm: Algorithm::HS256,
            ttl: Duration::minutes(5),
        },
        public_host: Url::parse("http://localhost:8080/").expect("url"),
        mail: None,
        cloudinary: None,
        cors_allowed_origins: vec!["http://localhost:3000".to_owned()],
        rate_limit_per_minute: NonZeroU32::MIN,
    }
}
