//! Shared building blocks for the SQL assistant services.
//!
//! Holds configuration loading, the error taxonomy, the API envelope,
//! request/response models, middleware and the SQL statement policy.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod telemetry;
pub mod utils;
