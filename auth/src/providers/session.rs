//! Session store trait.

use crate::error::Result;
use crate::state::{LoginCommit, Platform, ProviderCredential, SessionToken, UserId};

/// Durable record of session tokens and provider credentials.
///
/// # Implementation Notes
///
/// - `revoked` never moves back to `false`
/// - one credential per `(user_id, platform)`
/// - `commit_login` is all-or-nothing
pub trait SessionStore: Send + Sync {
    /// Persist a new session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the write fails.
    fn create_token(
        &self,
        token: &SessionToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up a token by value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the read fails.
    fn get_token(
        &self,
        value: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionToken>>> + Send;

    /// Mark one token revoked.
    ///
    /// # Returns
    ///
    /// `true` if a token flipped from valid to revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the write fails.
    fn revoke_token(&self, value: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Revoke every non-revoked token currently on record for `user_id`.
    ///
    /// # Returns
    ///
    /// Number of tokens revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the write fails.
    fn revoke_all_for_user(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Provider credential for `(user_id, platform)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the read fails.
    fn get_credential(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> impl std::future::Future<Output = Result<Option<ProviderCredential>>> + Send;

    /// Insert or overwrite the credential for its `(user_id, platform)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the write fails.
    fn upsert_credential(
        &self,
        credential: &ProviderCredential,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Replace only the access token of an existing credential.
    ///
    /// # Returns
    ///
    /// `false` if no credential exists for the pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if the write fails.
    fn update_access_token(
        &self,
        user_id: UserId,
        platform: Platform,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Persist a completed login in one transaction: upsert the credential,
    /// optionally revoke every prior token of the user, insert the new token.
    ///
    /// # Returns
    ///
    /// Number of prior tokens revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PersistenceFailure` if any step fails; nothing is
    /// written in that case.
    fn commit_login(
        &self,
        commit: &LoginCommit,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}
