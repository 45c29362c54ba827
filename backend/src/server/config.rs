//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::num::NonZeroU32;

use contacts_backend::config::AppConfig;

/// Listener and cross-cutting middleware settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) cors_allowed_origins: Vec<String>,
    pub(crate) rate_limit_per_minute: NonZeroU32,
}

impl ServerConfig {
    /// Construct a server configuration with no cross-origin access and the
    /// given per-client quota.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, rate_limit_per_minute: NonZeroU32) -> Self {
        Self {
            bind_addr,
            cors_allowed_origins: Vec::new(),
            rate_limit_per_minute,
        }
    }

    /// Allow browser calls from `origins`.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins;
        self
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.bind_addr, config.rate_limit_per_minute)
            .with_cors_origins(config.cors_allowed_origins.clone())
    }
}
