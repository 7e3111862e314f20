//! Email-keyed identity resolution.

use crate::error::{AuthError, Result};
use crate::providers::UserRepository;
use crate::state::{Platform, User};
use crate::utils::normalize_email;

/// Maps a provider profile onto exactly one internal user per email.
///
/// Concurrent first logins for the same email are serialized by the
/// repository's unique constraint: the loser of the insert race receives
/// [`AuthError::EmailTaken`] and re-reads the winner's row. No in-process
/// lock is involved, so this holds across server instances.
#[derive(Debug, Clone)]
pub struct IdentityResolver<U> {
    users: U,
}

impl<U: UserRepository> IdentityResolver<U> {
    /// Create a resolver over `users`.
    #[must_use]
    pub const fn new(users: U) -> Self {
        Self { users }
    }

    /// Look up the user for `email`, creating it on first sight.
    ///
    /// Returns `(user, is_new)`. An existing user is returned unchanged: the
    /// first platform and display name stay authoritative.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedProfile`]: email is empty after normalization
    /// - [`AuthError::PersistenceFailure`]: repository failure
    pub async fn resolve(
        &self,
        email: &str,
        display_name: &str,
        platform: Platform,
    ) -> Result<(User, bool)> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::MalformedProfile("empty email".to_string()));
        }

        if let Some(user) = self.users.get_user_by_email(&email).await? {
            return Ok((user, false));
        }

        let user = User::new(display_name.to_string(), email, platform);
        match self.users.create_user(&user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, %platform, "Created user");
                Ok((user, true))
            }
            Err(AuthError::EmailTaken) => {
                tracing::debug!(%platform, "Lost user creation race, re-reading");
                self.users
                    .get_user_by_email(&user.email)
                    .await?
                    .map(|winner| (winner, false))
                    .ok_or_else(|| {
                        AuthError::PersistenceFailure(
                            "email reported taken but user not found".to_string(),
                        )
                    })
            }
            Err(e) => Err(e),
        }
    }
}
