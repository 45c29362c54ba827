//! HTTP inbound adapter exposing the REST API.

pub mod auth;
pub mod bearer;
pub mod contacts;
pub mod contacts_dto;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

pub use error::ApiResult;
