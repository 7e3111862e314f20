//! Axum glue shared by the Playsync HTTP crates.
//!
//! - [`AppError`]: status code plus a client-safe `{"message": ...}` body;
//!   internal detail is logged, never serialized
//! - [`extractors`]: bearer token, correlation id and cookie lookup
//! - [`handlers`]: liveness endpoint
//!
//! # Example
//!
//! ```ignore
//! use playsync_web::{AppError, BearerToken};
//!
//! async fn me(BearerToken(token): BearerToken) -> Result<Json<User>, AppError> {
//!     let user = gateway.authenticate(Some(&token)).await
//!         .map_err(|_| AppError::unauthorized("Unauthorized"))?;
//!     Ok(Json(user))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId, cookie_value};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
