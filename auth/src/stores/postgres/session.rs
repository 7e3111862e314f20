//! PostgreSQL session token and provider credential store.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{LoginCommit, Platform, ProviderCredential, SessionToken, UserId};
use crate::stores::postgres::db_error;
use sqlx::{PgPool, Postgres, Row, Transaction};

/// PostgreSQL session store.
///
/// `commit_login` runs in a single transaction; every other method is one
/// statement.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Create a new PostgreSQL session store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &sqlx::postgres::PgRow) -> Result<SessionToken> {
        Ok(SessionToken {
            value: row.try_get("token_value").map_err(db_error("session_tokens.token_value"))?,
            user_id: UserId(row.try_get("user_id").map_err(db_error("session_tokens.user_id"))?),
            revoked: row.try_get("revoked").map_err(db_error("session_tokens.revoked"))?,
            issued_at: row.try_get("issued_at").map_err(db_error("session_tokens.issued_at"))?,
        })
    }

    fn row_to_credential(row: &sqlx::postgres::PgRow) -> Result<ProviderCredential> {
        let platform: String = row
            .try_get("platform")
            .map_err(db_error("provider_credentials.platform"))?;

        Ok(ProviderCredential {
            user_id: UserId(row.try_get("user_id").map_err(db_error("provider_credentials.user_id"))?),
            platform: platform
                .parse()
                .map_err(|_| AuthError::PersistenceFailure(format!("unknown platform {platform}")))?,
            subject_id: row
                .try_get("subject_id")
                .map_err(db_error("provider_credentials.subject_id"))?,
            access_token: row
                .try_get("access_token")
                .map_err(db_error("provider_credentials.access_token"))?,
            refresh_token: row
                .try_get("refresh_token")
                .map_err(db_error("provider_credentials.refresh_token"))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(db_error("provider_credentials.updated_at"))?,
        })
    }

    async fn upsert_credential_in(
        tx: &mut Transaction<'_, Postgres>,
        credential: &ProviderCredential,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO provider_credentials
                (user_id, platform, subject_id, access_token, refresh_token, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, platform) DO UPDATE SET
                subject_id = EXCLUDED.subject_id,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(credential.user_id.0)
        .bind(credential.platform.as_str())
        .bind(&credential.subject_id)
        .bind(&credential.access_token)
        .bind(credential.refresh_token.as_deref())
        .bind(credential.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to upsert credential"))?;

        Ok(())
    }
}

impl SessionStore for PostgresSessionStore {
    async fn create_token(&self, token: &SessionToken) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO session_tokens (token_value, user_id, revoked, issued_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&token.value)
        .bind(token.user_id.0)
        .bind(token.revoked)
        .bind(token.issued_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create token"))?;

        Ok(())
    }

    async fn get_token(&self, value: &str) -> Result<Option<SessionToken>> {
        let row = sqlx::query(
            r"
            SELECT token_value, user_id, revoked, issued_at
            FROM session_tokens
            WHERE token_value = $1
            ",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn revoke_token(&self, value: &str) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE session_tokens
            SET revoked = TRUE
            WHERE token_value = $1 AND revoked = FALSE
            ",
        )
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to revoke token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE session_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE
            ",
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to revoke tokens"))?;

        Ok(result.rows_affected())
    }

    async fn get_credential(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<ProviderCredential>> {
        let row = sqlx::query(
            r"
            SELECT user_id, platform, subject_id, access_token, refresh_token, updated_at
            FROM provider_credentials
            WHERE user_id = $1 AND platform = $2
            ",
        )
        .bind(user_id.0)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get credential"))?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }

    async fn upsert_credential(&self, credential: &ProviderCredential) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin"))?;
        Self::upsert_credential_in(&mut tx, credential).await?;
        tx.commit().await.map_err(db_error("Failed to commit"))
    }

    async fn update_access_token(
        &self,
        user_id: UserId,
        platform: Platform,
        access_token: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE provider_credentials
            SET access_token = $3, updated_at = NOW()
            WHERE user_id = $1 AND platform = $2
            ",
        )
        .bind(user_id.0)
        .bind(platform.as_str())
        .bind(access_token)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update access token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit_login(&self, commit: &LoginCommit) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin"))?;

        Self::upsert_credential_in(&mut tx, &commit.credential).await?;

        let revoked = if commit.revoke_prior {
            sqlx::query(
                r"
                UPDATE session_tokens
                SET revoked = TRUE
                WHERE user_id = $1 AND revoked = FALSE
                ",
            )
            .bind(commit.token.user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to revoke tokens"))?
            .rows_affected()
        } else {
            0
        };

        sqlx::query(
            r"
            INSERT INTO session_tokens (token_value, user_id, revoked, issued_at)
            VALUES ($1, $2, FALSE, $3)
            ",
        )
        .bind(&commit.token.value)
        .bind(commit.token.user_id.0)
        .bind(commit.token.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create token"))?;

        // Dropping `tx` on any early return above rolls everything back
        tx.commit().await.map_err(db_error("Failed to commit"))?;

        Ok(revoked)
    }
}
