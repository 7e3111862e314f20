//! Mock session store for testing.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{LoginCommit, Platform, ProviderCredential, SessionToken, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Records {
    tokens: HashMap<String, SessionToken>,
    credentials: HashMap<(UserId, Platform), ProviderCredential>,
}

/// Mock session store.
///
/// Tokens and credentials share one mutex, which makes `commit_login`
/// trivially atomic.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    records: Arc<Mutex<Records>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockSessionStore {
    /// Create a new mock session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with `PersistenceFailure`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every token on record, revoked or not.
    #[must_use]
    pub fn all_tokens(&self) -> Vec<SessionToken> {
        self.records
            .lock()
            .map(|r| r.tokens.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Tokens of `user_id` that are not revoked.
    #[must_use]
    pub fn live_tokens(&self, user_id: UserId) -> Vec<SessionToken> {
        self.all_tokens()
            .into_iter()
            .filter(|t| t.user_id == user_id && !t.revoked)
            .collect()
    }

    /// Number of stored credentials.
    #[must_use]
    pub fn credential_count(&self) -> usize {
        self.records
            .lock()
            .map(|r| r.credentials.len())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Records>> {
        self.records
            .lock()
            .map_err(|_| AuthError::InternalError("mock session store lock poisoned".to_string()))
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AuthError::PersistenceFailure("session store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        self.check_writable()?;
        let mut records = self.lock()?;
        f(&mut *records)
    }
}

fn revoke_all(records: &mut Records, user_id: UserId) -> u64 {
    let mut count = 0;
    for token in records.tokens.values_mut() {
        if token.user_id == user_id && !token.revoked {
            token.revoked = true;
            count += 1;
        }
    }
    count
}

impl SessionStore for MockSessionStore {
    fn create_token(&self, token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let result = self.write(|records| {
            if records.tokens.contains_key(&token.value) {
                return Err(AuthError::PersistenceFailure("duplicate token".to_string()));
            }
            records.tokens.insert(token.value.clone(), token.clone());
            Ok(())
        });

        async move { result }
    }

    fn get_token(&self, value: &str) -> impl Future<Output = Result<Option<SessionToken>>> + Send {
        let result = self.lock().map(|records| records.tokens.get(value).cloned());

        async move { result }
    }

    fn revoke_token(&self, value: &str) -> impl Future<Output = Result<bool>> + Send {
        let result = self.write(|records| {
            Ok(match records.tokens.get_mut(value) {
                Some(token) if !token.revoked => {
                    token.revoked = true;
                    true
                }
                _ => false,
            })
        });

        async move { result }
    }

    fn revoke_all_for_user(&self, user_id: UserId) -> impl Future<Output = Result<u64>> + Send {
        let result = self.write(|records| Ok(revoke_all(records, user_id)));

        async move { result }
    }

    fn get_credential(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> impl Future<Output = Result<Option<ProviderCredential>>> + Send {
        let result = self
            .lock()
            .map(|records| records.credentials.get(&(user_id, platform)).cloned());

        async move { result }
    }

    fn upsert_credential(
        &self,
        credential: &ProviderCredential,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.write(|records| {
            records.credentials.insert(
                (credential.user_id, credential.platform),
                credential.clone(),
            );
            Ok(())
        });

        async move { result }
    }

    fn update_access_token(
        &self,
        user_id: UserId,
        platform: Platform,
        access_token: &str,
    ) -> impl Future<Output = Result<bool>> + Send {
        let result = self.write(|records| {
            Ok(match records.credentials.get_mut(&(user_id, platform)) {
                Some(credential) => {
                    credential.access_token = access_token.to_string();
                    credential.updated_at = chrono::Utc::now();
                    true
                }
                None => false,
            })
        });

        async move { result }
    }

    fn commit_login(&self, commit: &LoginCommit) -> impl Future<Output = Result<u64>> + Send {
        let result = self.write(|records| {
            if records.tokens.contains_key(&commit.token.value) {
                return Err(AuthError::PersistenceFailure("duplicate token".to_string()));
            }
            let credential = &commit.credential;
            records
                .credentials
                .insert((credential.user_id, credential.platform), credential.clone());
            let revoked = if commit.revoke_prior {
                revoke_all(records, commit.token.user_id)
            } else {
                0
            };
            records
                .tokens
                .insert(commit.token.value.clone(), commit.token.clone());
            Ok(revoked)
        });

        async move { result }
    }
}
