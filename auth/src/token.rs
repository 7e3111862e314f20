//! Session token issuance, validation, revocation and refresh.
//!
//! # Token format
//!
//! ```text
//! base64url(user_id[16] ‖ nonce[32]) "." base64url(HMAC-SHA256(payload))
//! ```
//!
//! The MAC lets forged or truncated tokens be rejected before the store is
//! touched. The store stays authoritative: a correctly signed token is only
//! valid while its row exists, is not revoked and is within `session_ttl`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::constants::{MIN_TOKEN_SECRET_LEN, TOKEN_NONCE_BYTES};
use crate::error::{AuthError, Result};
use crate::providers::{SessionStore, UserRepository};
use crate::state::{LoginCommit, Platform, ProviderCredential, SessionToken, User, UserId};
use crate::utils::redact;

type HmacSha256 = Hmac<Sha256>;

const USER_ID_BYTES: usize = 16;
const PAYLOAD_BYTES: usize = USER_ID_BYTES + TOKEN_NONCE_BYTES;

/// Signs and structurally verifies session token values.
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<[u8]>,
}

impl TokenSigner {
    /// Create a signer.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if `secret` is shorter than 32 bytes.
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(AuthError::InternalError(format!(
                "token secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self { key: secret.into() })
    }

    /// Produce a fresh token value bound to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the MAC cannot be keyed.
    pub fn sign(&self, user_id: UserId) -> Result<String> {
        let nonce: [u8; TOKEN_NONCE_BYTES] = rand::random();
        let mut payload = [0u8; PAYLOAD_BYTES];
        payload[..USER_ID_BYTES].copy_from_slice(user_id.0.as_bytes());
        payload[USER_ID_BYTES..].copy_from_slice(&nonce);

        let mut mac = self.mac()?;
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// Check structure and signature, returning the embedded user id.
    ///
    /// The tag comparison is constant-time.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<UserId> {
        let (payload, tag) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        if payload.len() != PAYLOAD_BYTES {
            return None;
        }
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;

        uuid::Uuid::from_slice(&payload[..USER_ID_BYTES])
            .ok()
            .map(UserId)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuthError::InternalError(format!("Invalid HMAC key: {e}")))
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("key", &"[REDACTED]").finish()
    }
}

/// Session token lifecycle over a [`SessionStore`] and a [`UserRepository`].
#[derive(Debug, Clone)]
pub struct TokenService<U, S> {
    users: U,
    sessions: S,
    signer: TokenSigner,
    session_ttl: Option<Duration>,
}

impl<U: UserRepository, S: SessionStore> TokenService<U, S> {
    /// Create a token service.
    #[must_use]
    pub const fn new(users: U, sessions: S, signer: TokenSigner, session_ttl: Option<Duration>) -> Self {
        Self {
            users,
            sessions,
            signer,
            session_ttl,
        }
    }

    /// Underlying session store.
    #[must_use]
    pub const fn sessions(&self) -> &S {
        &self.sessions
    }

    fn new_token(&self, user_id: UserId) -> Result<SessionToken> {
        Ok(SessionToken {
            value: self.signer.sign(user_id)?,
            user_id,
            revoked: false,
            issued_at: Utc::now(),
        })
    }

    /// Issue and persist a new session token for `user`.
    ///
    /// Prior tokens are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PersistenceFailure`] if the token cannot be stored.
    pub async fn issue_session(&self, user: &User) -> Result<String> {
        let token = self.new_token(user.id)?;
        self.sessions.create_token(&token).await?;
        tracing::debug!(user_id = %user.id, "Issued session token");
        Ok(token.value)
    }

    /// Revoke every token currently on record for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PersistenceFailure`] if the store write fails.
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64> {
        let count = self.sessions.revoke_all_for_user(user_id).await?;
        tracing::info!(%user_id, count, "Revoked all session tokens");
        Ok(count)
    }

    /// Revoke a single token.
    ///
    /// Returns `false` if the token was unknown or already revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PersistenceFailure`] if the store write fails.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let revoked = self.sessions.revoke_token(token).await?;
        tracing::debug!(token = %redact(token), revoked, "Revoked session token");
        Ok(revoked)
    }

    /// Resolve the owner of a presented token.
    ///
    /// Pure read; no state is mutated on success or failure.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`]: absent, malformed, forged, unknown,
    ///   revoked or expired token, or owner no longer exists
    /// - [`AuthError::PersistenceFailure`]: store unreachable
    pub async fn validate(&self, token: Option<&str>) -> Result<User> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;
        let claimed = self.signer.verify(token).ok_or(AuthError::Unauthenticated)?;

        let record = self
            .sessions
            .get_token(token)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if record.revoked || record.user_id != claimed {
            return Err(AuthError::Unauthenticated);
        }

        // A lifetime past the calendar range never expires
        let expires_at = self
            .session_ttl
            .and_then(|ttl| record.issued_at.checked_add_signed(ttl));
        if expires_at.is_some_and(|at| at < Utc::now()) {
            return Err(AuthError::Unauthenticated);
        }

        match self.users.get_user_by_id(record.user_id).await {
            Err(AuthError::UserNotFound) => Err(AuthError::Unauthenticated),
            other => other,
        }
    }

    /// Issue a new session token for an existing user without an OAuth
    /// round-trip. The previous token stays valid.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserNotFound`]: unknown user id
    /// - [`AuthError::PersistenceFailure`]: store failure
    pub async fn refresh_session(&self, user_id: UserId) -> Result<String> {
        let user = self.users.get_user_by_id(user_id).await?;
        self.issue_session(&user).await
    }

    /// Replace the stored provider access token of `(user_id, platform)`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderTokenRefreshFailed`]: no credential on record
    /// - [`AuthError::PersistenceFailure`]: store failure
    pub async fn refresh_provider_token(
        &self,
        user_id: UserId,
        platform: Platform,
        new_access_token: &str,
    ) -> Result<()> {
        let updated = self
            .sessions
            .update_access_token(user_id, platform, new_access_token)
            .await?;

        if updated {
            Ok(())
        } else {
            Err(AuthError::ProviderTokenRefreshFailed(format!(
                "no {platform} credential on record"
            )))
        }
    }

    /// Persist a completed login atomically.
    ///
    /// Stores the credential, revokes prior tokens when `revoke_prior` is set
    /// and inserts a new token, all in one store transaction. Returns the new
    /// token value and the number of tokens revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PersistenceFailure`]; nothing is written then.
    pub async fn commit_login(
        &self,
        credential: ProviderCredential,
        revoke_prior: bool,
    ) -> Result<(String, u64)> {
        let token = self.new_token(credential.user_id)?;
        let commit = LoginCommit {
            credential,
            revoke_prior,
            token,
        };

        let revoked = self.sessions.commit_login(&commit).await?;
        Ok((commit.token.value, revoked))
    }
}
