//! Error types for authentication and session operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the login flow and the token service.
///
/// Variants carrying a `String` hold diagnostic detail for logs. That detail
/// is never forwarded to HTTP clients.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Federation Errors
    // ═══════════════════════════════════════════════════════════

    /// Anti-forgery `state` missing or not equal to the cookie value.
    #[error("Invalid OAuth state parameter")]
    InvalidState,

    /// Authorization code could not be exchanged for provider tokens.
    #[error("OAuth code exchange failed: {0}")]
    CodeExchangeFailed(String),

    /// Provider profile could not be retrieved.
    #[error("Failed to fetch provider profile: {0}")]
    ProfileFetchFailed(String),

    /// Provider profile was retrieved but lacks a mandatory field.
    #[error("Malformed provider profile: {0}")]
    MalformedProfile(String),

    /// Provider refused to refresh an access token.
    #[error("Provider token refresh failed: {0}")]
    ProviderTokenRefreshFailed(String),

    /// Platform slug does not name a supported provider.
    #[error("Unsupported provider: {0}")]
    ProviderNotSupported(String),

    /// Provider is known but has no client configuration on this server.
    #[error("Provider is not configured")]
    ProviderNotConfigured,

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Session token missing, malformed, expired or revoked.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// No user exists with the requested id.
    #[error("User not found")]
    UserNotFound,

    /// A user with this email already exists (uniqueness constraint).
    #[error("Email already registered")]
    EmailTaken,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Store unreachable or write rejected.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is caused by the caller rather than the system.
    ///
    /// # Examples
    ///
    /// ```
    /// # use playsync_auth::AuthError;
    /// assert!(AuthError::Unauthenticated.is_user_error());
    /// assert!(!AuthError::PersistenceFailure("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState
                | Self::Unauthenticated
                | Self::UserNotFound
                | Self::ProviderNotSupported(_)
        )
    }

    /// Returns `true` if this error indicates possible tampering.
    ///
    /// # Examples
    ///
    /// ```
    /// # use playsync_auth::AuthError;
    /// assert!(AuthError::InvalidState.is_security_issue());
    /// assert!(!AuthError::UserNotFound.is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::InvalidState | Self::MalformedProfile(_))
    }

    /// Returns `true` if the provider (or the path to it) failed.
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::CodeExchangeFailed(_)
                | Self::ProfileFetchFailed(_)
                | Self::ProviderTokenRefreshFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failures_are_classified() {
        assert!(AuthError::CodeExchangeFailed("timeout".into()).is_provider_failure());
        assert!(AuthError::ProfileFetchFailed("503".into()).is_provider_failure());
        assert!(!AuthError::InvalidState.is_provider_failure());
    }

    #[test]
    fn test_caller_errors_are_not_system_failures() {
        for err in [
            AuthError::InvalidState,
            AuthError::Unauthenticated,
            AuthError::ProviderNotSupported("deezer".into()),
        ] {
            assert!(err.is_user_error());
            assert!(!err.is_provider_failure());
        }
        assert!(!AuthError::CodeExchangeFailed("timeout".into()).is_user_error());
        assert!(!AuthError::EmailTaken.is_user_error());
    }

    #[test]
    fn test_display_keeps_detail_for_logs() {
        let err = AuthError::CodeExchangeFailed("invalid_grant".into());
        assert_eq!(err.to_string(), "OAuth code exchange failed: invalid_grant");
    }
}
