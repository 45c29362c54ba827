//! Application configuration loaded via OrthoConfig.
//!
//! [`AppSettings`] is the raw layered view (CLI flags, `CONTACTS_*`
//! environment variables and config files). [`AppSettings::validate`] turns
//! it into an [`AppConfig`] that the server bootstrap injects into the
//! adapters, so nothing downstream reads the environment.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use ortho_config::OrthoConfig;
use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;
use zeroize::Zeroizing;

use crate::outbound::avatar::CloudinaryCredentials;
use crate::outbound::mail::SmtpMailerConfig;
use crate::outbound::persistence::PoolConfig;
use crate::outbound::security::SUPPORTED_ALGORITHMS;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_HOST: &str = "http://localhost:8080/";
const DEFAULT_JWT_ALGORITHM: &str = "HS256";
const DEFAULT_MAIL_FROM_NAME: &str = "Contacts";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const EPHEMERAL_SECRET_BYTES: usize = 32;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    #[error("invalid bind address `{value}`")]
    InvalidBindAddr { value: String },
    #[error("CONTACTS_JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("unsupported JWT algorithm `{value}`; expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm { value: String },
    #[error("invalid public host `{value}`: {reason}")]
    InvalidPublicHost { value: String, reason: String },
    #[error("mail server configured without `{field}`")]
    IncompleteMail { field: &'static str },
    #[error("image host configured without `{field}`")]
    IncompleteCloudinary { field: &'static str },
    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },
    #[error("no CORS origins configured")]
    NoCorsOrigins,
}

/// Layered settings as read from CLI, environment and config files.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONTACTS")]
pub struct AppSettings {
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    pub bind_addr: Option<String>,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: Option<String>,
    #[ortho_config(default = 3600)]
    pub jwt_expiration_seconds: u32,
    /// Base URL embedded in verification links.
    pub public_host: Option<String>,
    pub mail_server: Option<String>,
    #[ortho_config(default = 465)]
    pub mail_port: u16,
    pub mail_username: Option<String>,
    pub mail_password: Option<String>,
    pub mail_from: Option<String>,
    pub mail_from_name: Option<String>,
    pub cloudinary_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    /// Comma-separated list of browser origins.
    pub cors_allowed_origins: Option<String>,
    #[ortho_config(default = 10)]
    pub rate_limit_per_minute: u32,
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("database_configured", &self.database_url.is_some())
            .field("bind_addr", &self.bind_addr)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("public_host", &self.public_host)
            .field("mail_server", &self.mail_server)
            .field("cloudinary_name", &self.cloudinary_name)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish_non_exhaustive()
    }
}

/// Bearer token signing parameters.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: Zeroizing<Vec<u8>>,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

/// Validated configuration injected at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub database: Option<PoolConfig>,
    pub bind_addr: SocketAddr,
    pub jwt: JwtConfig,
    pub public_host: Url,
    pub mail: Option<SmtpMailerConfig>,
    pub cloudinary: Option<CloudinaryCredentials>,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_per_minute: NonZeroU32,
}

impl AppConfig {
    /// Load settings from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a layer fails to parse or a value is
    /// rejected by validation.
    pub fn load() -> Result<Self, ConfigError> {
        AppSettings::load()
            .map_err(|err| ConfigError::Load {
                message: err.to_string(),
            })?
            .validate()
    }
}

impl AppSettings {
    /// Validate into an [`AppConfig`].
    ///
    /// Debug builds tolerate a missing JWT secret by generating an ephemeral
    /// one; release builds refuse to start.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(self) -> Result<AppConfig, ConfigError> {
        self.validate_with(cfg!(debug_assertions))
    }

    fn validate_with(self, allow_ephemeral_secret: bool) -> Result<AppConfig, ConfigError> {
        let max_connections = non_zero(self.db_max_connections, "db_max_connections")?;
        let database = self
            .database_url
            .filter(|url| !url.trim().is_empty())
            .map(|url| PoolConfig::new(url).with_max_size(max_connections.get()));

        let bind_value = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_value
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr { value: bind_value })?;

        let jwt = jwt_config(
            self.jwt_secret,
            self.jwt_algorithm,
            self.jwt_expiration_seconds,
            allow_ephemeral_secret,
        )?;
        let public_host = public_host(self.public_host)?;

        let mail = match self.mail_server.filter(|server| !server.trim().is_empty()) {
            None => None,
            Some(server) => Some(SmtpMailerConfig {
                server,
                port: self.mail_port,
                username: required(self.mail_username, "mail_username")
                    .map_err(|field| ConfigError::IncompleteMail { field })?,
                password: Zeroizing::new(
                    required(self.mail_password, "mail_password")
                        .map_err(|field| ConfigError::IncompleteMail { field })?,
                ),
                from_address: required(self.mail_from, "mail_from")
                    .map_err(|field| ConfigError::IncompleteMail { field })?,
                from_name: self
                    .mail_from_name
                    .unwrap_or_else(|| DEFAULT_MAIL_FROM_NAME.to_owned()),
                public_host: public_host.clone(),
            }),
        };

        let cloudinary = cloudinary_credentials(
            self.cloudinary_name,
            self.cloudinary_api_key,
            self.cloudinary_api_secret,
        )?;

        let cors_allowed_origins = parse_origins(
            self.cors_allowed_origins
                .as_deref()
                .unwrap_or(DEFAULT_CORS_ORIGIN),
        );
        if cors_allowed_origins.is_empty() {
            return Err(ConfigError::NoCorsOrigins);
        }

        Ok(AppConfig {
            database,
            bind_addr,
            jwt,
            public_host,
            mail,
            cloudinary,
            cors_allowed_origins,
            rate_limit_per_minute: non_zero(self.rate_limit_per_minute, "rate_limit_per_minute")?,
        })
    }
}

fn non_zero(value: u32, field: &'static str) -> Result<NonZeroU32, ConfigError> {
    NonZeroU32::new(value).ok_or(ConfigError::Zero { field })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, &'static str> {
    value.filter(|v| !v.trim().is_empty()).ok_or(field)
}

fn jwt_config(
    secret: Option<String>,
    algorithm: Option<String>,
    expiration_seconds: u32,
    allow_ephemeral_secret: bool,
) -> Result<JwtConfig, ConfigError> {
    let secret = match secret.filter(|s| !s.is_empty()) {
        Some(secret) => Zeroizing::new(secret.into_bytes()),
        None if allow_ephemeral_secret => {
            warn!("CONTACTS_JWT_SECRET unset; using an ephemeral secret (dev only)");
            let mut bytes = vec![0_u8; EPHEMERAL_SECRET_BYTES];
            rand::thread_rng().fill_bytes(&mut bytes);
            Zeroizing::new(bytes)
        }
        None => return Err(ConfigError::MissingJwtSecret),
    };

    let name = algorithm.unwrap_or_else(|| DEFAULT_JWT_ALGORITHM.to_owned());
    let algorithm = Algorithm::from_str(name.trim().to_ascii_uppercase().as_str())
        .ok()
        .filter(|alg| SUPPORTED_ALGORITHMS.contains(alg))
        .ok_or(ConfigError::UnsupportedAlgorithm { value: name })?;

    let seconds = non_zero(expiration_seconds, "jwt_expiration_seconds")?;
    Ok(JwtConfig {
        secret,
        algorithm,
        ttl: Duration::seconds(i64::from(seconds.get())),
    })
}

fn public_host(value: Option<String>) -> Result<Url, ConfigError> {
    let mut raw = value.unwrap_or_else(|| DEFAULT_PUBLIC_HOST.to_owned());
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|err| ConfigError::InvalidPublicHost {
        value: raw.clone(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidPublicHost {
            reason: format!("unsupported scheme `{other}`"),
            value: raw,
        }),
    }
}

fn cloudinary_credentials(
    name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
) -> Result<Option<CloudinaryCredentials>, ConfigError> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !present(&name) && !present(&api_key) && !present(&api_secret) {
        return Ok(None);
    }
    let incomplete = |field| ConfigError::IncompleteCloudinary { field };
    Ok(Some(CloudinaryCredentials {
        cloud_name: required(name, "cloudinary_name").map_err(incomplete)?,
        api_key: required(api_key, "cloudinary_api_key").map_err(incomplete)?,
        api_secret: Zeroizing::new(
            required(api_secret, "cloudinary_api_secret").map_err(incomplete)?,
        ),
    }))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}
