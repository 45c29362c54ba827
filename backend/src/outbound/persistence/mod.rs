//! Persistence adapters for the contact store.
//!
//! The PostgreSQL adapter uses Diesel with `diesel-async` over a `bb8` pool;
//! the in-memory adapter backs development runs without a database. Row
//! structs and the Diesel schema stay private to this module.

mod diesel_contact_repository;
mod in_memory_contact_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_contact_repository::DieselContactRepository;
pub use in_memory_contact_repository::InMemoryContactRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
