//! Contacts backend library: domain, adapters and HTTP surface.
//!
//! The binary in `main.rs` only wires these pieces together; integration
//! tests build the same app through [`inbound::http::routes::configure`].

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
