//! Playsync HTTP server.
//!
//! Wires configuration, the Postgres-backed auth stores and the provider
//! adapters into one Axum application.

pub mod config;
pub mod routes;

pub use config::{Config, ConfigError};
pub use routes::build_router;
