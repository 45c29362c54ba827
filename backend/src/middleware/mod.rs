//! Request middleware.
//!
//! Purpose: request lifecycle concerns that sit in front of handlers, namely
//! trace correlation and per-client throttling.

pub mod rate_limit;
pub mod trace;

pub use rate_limit::{EndpointLimits, RATE_LIMIT_MESSAGE, RateLimit};
pub use trace::Trace;
