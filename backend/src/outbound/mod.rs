//! Outbound adapters implementing the domain's driven ports.
//!
//! - `persistence`: PostgreSQL (Diesel) and in-memory contact stores.
//! - `security`: Argon2 password hashing and JWT bearer tokens.
//! - `mail`: SMTP delivery of verification emails.
//! - `avatar`: Cloudinary image hosting.
//!
//! Adapters stay thin: they translate between port types and the external
//! system and hold no business rules.

pub mod avatar;
pub mod mail;
pub mod persistence;
pub mod security;
