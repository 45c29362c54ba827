//! Backend entry-point: loads configuration, wires adapters and serves the
//! REST API with health probes and OpenAPI docs.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use contacts_backend::config::AppConfig;
use contacts_backend::inbound::http::health::HealthState;

use server::{ServerConfig, build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let http_state = build_http_state(&config, Arc::new(DefaultClock)).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, ServerConfig::from(&config))?;
    let outcome = server.await;

    health_state.mark_draining();
    info!("server stopped");
    outcome
}
