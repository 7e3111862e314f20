//! Mock provider implementations for testing.
//!
//! In-memory implementations of the provider adapter and storage traits for
//! unit and integration tests.

pub mod oauth;
pub mod session;
pub mod user;

pub use oauth::{MockFailure, MockProviderAdapter};
pub use session::MockSessionStore;
pub use user::MockUserRepository;
