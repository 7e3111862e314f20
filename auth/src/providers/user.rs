//! User repository trait.

use crate::error::Result;
use crate::state::{User, UserId};

/// User repository.
///
/// Emails arrive already normalized; implementations compare them exactly.
///
/// # Implementation Notes
///
/// - `email` must be unique at the storage level
/// - `create_user` is the only write; users are never updated or deleted here
pub trait UserRepository: Send + Sync {
    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - User not found → `AuthError::UserNotFound`
    /// - Database query fails → `AuthError::PersistenceFailure`
    fn get_user_by_id(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<User>> + Send;

    /// Get user by (normalized) email.
    ///
    /// # Returns
    ///
    /// `None` if no user has this email.
    ///
    /// # Errors
    ///
    /// Returns error if database query fails.
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Email already exists → `AuthError::EmailTaken`
    /// - Database write fails → `AuthError::PersistenceFailure`
    fn create_user(&self, user: &User) -> impl std::future::Future<Output = Result<()>> + Send;
}
