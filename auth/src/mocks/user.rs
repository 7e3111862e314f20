//! Mock user repository for testing.

use crate::error::{AuthError, Result};
use crate::providers::UserRepository;
use crate::state::{User, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

/// Mock user repository.
///
/// In-memory, behind a single mutex so the email uniqueness check and the
/// insert happen atomically, like a unique index.
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Users>>,
    hidden_lookups: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MockUserRepository {
    /// Create a new mock user repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly.
    pub fn insert(&self, user: User) {
        if let Ok(mut users) = self.users.lock() {
            users.by_email.insert(user.email.clone(), user.id);
            users.by_id.insert(user.id, user);
        }
    }

    /// Number of stored users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.users.lock().map(|u| u.by_id.len()).unwrap_or_default()
    }

    /// Make the next `n` email lookups miss, simulating a concurrent insert
    /// that commits between lookup and create.
    pub fn hide_next_email_lookups(&self, n: usize) {
        self.hidden_lookups.store(n, Ordering::SeqCst);
    }

    /// Make every call fail with `PersistenceFailure`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthError::PersistenceFailure("user store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn poisoned<T>(_: T) -> AuthError {
    AuthError::InternalError("mock user store lock poisoned".to_string())
}

impl UserRepository for MockUserRepository {
    fn get_user_by_id(&self, user_id: UserId) -> impl Future<Output = Result<User>> + Send {
        let result = self.check_available().and_then(|()| {
            self.users
                .lock()
                .map_err(poisoned)?
                .by_id
                .get(&user_id)
                .cloned()
                .ok_or(AuthError::UserNotFound)
        });

        async move { result }
    }

    fn get_user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send {
        let hidden = self
            .hidden_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let result = self.check_available().and_then(|()| {
            if hidden {
                return Ok(None);
            }
            let users = self.users.lock().map_err(poisoned)?;
            Ok(users
                .by_email
                .get(email)
                .and_then(|id| users.by_id.get(id))
                .cloned())
        });

        async move { result }
    }

    fn create_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send {
        let users = Arc::clone(&self.users);
        let user = user.clone();
        let available = self.check_available();

        async move {
            available?;
            // Yield so concurrent creators interleave between lookup and insert
            tokio::task::yield_now().await;

            let mut users = users.lock().map_err(poisoned)?;
            if users.by_email.contains_key(&user.email) {
                return Err(AuthError::EmailTaken);
            }
            users.by_email.insert(user.email.clone(), user.id);
            users.by_id.insert(user.id, user);
            Ok(())
        }
    }
}
