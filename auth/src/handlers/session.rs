//! Session handlers: logout, token refresh, current user.

use crate::gateway::AuthGateway;
use crate::handlers::middleware::AuthenticatedUser;
use crate::handlers::oauth::AccessTokenResponse;
use crate::providers::{SessionStore, UserRepository};
use crate::state::{User, UserId};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use playsync_web::{AppError, BearerToken, CorrelationId, WebResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Refresh request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    /// User to issue a new session token for.
    pub user_id: uuid::Uuid,
}

/// Logout response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// Revoke the presenting session token.
///
/// # Endpoint
///
/// ```text
/// POST /auth/logout
/// Authorization: Bearer <token>
/// ```
///
/// Other sessions of the same user stay valid.
///
/// # Errors
///
/// 401 if the token is missing or not currently valid.
pub async fn logout<U, S>(
    State(gateway): State<Arc<AuthGateway<U, S>>>,
    correlation_id: CorrelationId,
    BearerToken(token): BearerToken,
) -> WebResult<Json<StatusResponse>>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    let user = gateway.logout(Some(&token)).await?;
    tracing::debug!(correlation_id = %correlation_id.0, user_id = %user.id, "Session revoked");

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// Issue a new session token for a known user.
///
/// # Endpoint
///
/// ```text
/// POST /refresh-token
/// { "userId": "..." }
/// ```
///
/// The previous token is not revoked.
///
/// # Errors
///
/// - 400: body is not `{ "userId": <uuid> }`
/// - 404: unknown user
pub async fn refresh_token<U, S>(
    State(gateway): State<Arc<AuthGateway<U, S>>>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> WebResult<Json<AccessTokenResponse>>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected refresh request body");
        AppError::bad_request("Invalid request body")
    })?;

    let access_token = gateway.refresh_session(UserId(request.user_id)).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// Current user.
///
/// # Endpoint
///
/// ```text
/// GET /api/users/me
/// Authorization: Bearer <token>
/// ```
#[allow(clippy::unused_async)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
