//! HTTP handlers for authentication endpoints.
//!
//! Handlers are thin: they translate HTTP into [`AuthGateway`] calls and map
//! [`AuthError`] onto [`AppError`]. Provider and store detail is logged,
//! never returned.
//!
//! [`AuthGateway`]: crate::gateway::AuthGateway

pub mod middleware;
pub mod oauth;
pub mod session;

use crate::error::AuthError;
use playsync_web::AppError;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::unauthorized("Unauthorized"),
            AuthError::UserNotFound => Self::not_found("User not found"),
            AuthError::ProviderNotSupported(_) | AuthError::ProviderNotConfigured => {
                Self::not_found("Provider not available")
            }
            AuthError::InvalidState
            | AuthError::CodeExchangeFailed(_)
            | AuthError::ProfileFetchFailed(_)
            | AuthError::MalformedProfile(_) => {
                Self::internal("Authentication failed").with_source(err.into())
            }
            AuthError::ProviderTokenRefreshFailed(_)
            | AuthError::EmailTaken
            | AuthError::PersistenceFailure(_)
            | AuthError::InternalError(_) => {
                Self::internal("Internal server error").with_source(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::ProviderNotConfigured, StatusCode::NOT_FOUND),
            (AuthError::InvalidState, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AuthError::PersistenceFailure("db down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_provider_detail_is_not_exposed() {
        let err = AppError::from(AuthError::CodeExchangeFailed(
            "invalid_client: secret mismatch".into(),
        ));
        assert_eq!(err.message(), "Authentication failed");
    }
}
