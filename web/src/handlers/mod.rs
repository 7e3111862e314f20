//! HTTP request handlers that do not belong to a domain crate.

pub mod health;

pub use health::health_check;
