//! Storage implementations for the auth system.
//!
//! - **PostgreSQL** (feature `postgres`): users, provider credentials and
//!   session tokens
//!
//! In-memory implementations for tests live in [`crate::mocks`].

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-exports
#[cfg(feature = "postgres")]
pub use postgres::{PostgresSessionStore, PostgresUserRepository};
