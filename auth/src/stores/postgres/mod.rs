//! PostgreSQL storage implementations.
//!
//! - [`PostgresUserRepository`]: `users`
//! - [`PostgresSessionStore`]: `session_tokens` and `provider_credentials`
//!
//! Schema lives in `auth/migrations`; run it once with [`migrate`].

pub mod session;
pub mod user;

// Re-exports
pub use session::PostgresSessionStore;
pub use user::PostgresUserRepository;

use crate::error::{AuthError, Result};
use sqlx::PgPool;

/// Run the embedded auth migrations.
///
/// # Errors
///
/// Returns [`AuthError::PersistenceFailure`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::PersistenceFailure(format!("Migration failed: {e}")))
}

pub(crate) fn db_error(context: &str) -> impl Fn(sqlx::Error) -> AuthError + '_ {
    move |e| AuthError::PersistenceFailure(format!("{context}: {e}"))
}
