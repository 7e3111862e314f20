//! PostgreSQL user repository implementation.
//!
//! # Example
//!
//! ```no_run
//! use playsync_auth::stores::postgres::PostgresUserRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/playsync").await?;
//! let repo = PostgresUserRepository::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::UserRepository;
use crate::state::{User, UserId};
use crate::stores::postgres::db_error;
use sqlx::{PgPool, Row};

/// PostgreSQL user repository.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User> {
        let platform: String = row.try_get("platform").map_err(db_error("users.platform"))?;

        Ok(User {
            id: UserId(row.try_get("id").map_err(db_error("users.id"))?),
            username: row.try_get("username").map_err(db_error("users.username"))?,
            email: row.try_get("email").map_err(db_error("users.email"))?,
            platform: platform
                .parse()
                .map_err(|_| AuthError::PersistenceFailure(format!("unknown platform {platform}")))?,
            created_at: row.try_get("created_at").map_err(db_error("users.created_at"))?,
        })
    }
}

impl UserRepository for PostgresUserRepository {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, platform, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user"))?
        .ok_or(AuthError::UserNotFound)?;

        Self::row_to_user(&row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, platform, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user"))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, email, platform, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.platform.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailTaken;
                }
            }
            AuthError::PersistenceFailure(format!("Failed to create user: {e}"))
        })?;

        Ok(())
    }
}
