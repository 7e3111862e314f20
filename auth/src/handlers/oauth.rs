//! Login redirect and provider callback handlers.

use crate::gateway::{AuthGateway, CallbackParams};
use crate::providers::{SessionStore, UserRepository};
use crate::state::Platform;
use axum::{
    Json,
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use playsync_web::{AppError, CorrelationId, WebResult, cookie_value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Provider callback query parameters.
///
/// Every field is optional so a missing `state` or `code` reaches the
/// gateway and fails there, instead of failing query parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code from provider.
    pub code: Option<String>,

    /// Echoed anti-forgery state.
    pub state: Option<String>,

    /// Error from provider (e.g., `access_denied`).
    pub error: Option<String>,

    /// Error description from provider.
    pub error_description: Option<String>,
}

/// Successful callback body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    /// New session token.
    pub access_token: String,
}

/// Redirect the browser to the provider consent screen.
///
/// # Endpoint
///
/// ```text
/// GET /auth/{platform}-login
/// ```
///
/// Sets the anti-forgery cookie and answers `307 Temporary Redirect`.
///
/// # Errors
///
/// 404 when the platform is not configured.
pub async fn login<U, S>(
    gateway: Arc<AuthGateway<U, S>>,
    platform: Platform,
    correlation_id: CorrelationId,
) -> WebResult<Response>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    let redirect = gateway.begin_login(platform)?;
    tracing::info!(correlation_id = %correlation_id.0, %platform, "Redirecting to provider");

    Ok((
        [(header::SET_COOKIE, redirect.set_cookie)],
        Redirect::temporary(&redirect.url),
    )
        .into_response())
}

/// Complete the login and return the session token.
///
/// # Endpoint
///
/// ```text
/// GET /auth/{platform}-callback?code=...&state=...
/// ```
///
/// # Response
///
/// ```json
/// { "accessToken": "..." }
/// ```
///
/// # Errors
///
/// 500 with a generic message for any failed stage. The anti-forgery
/// cookie is cleared either way.
pub async fn callback<U, S>(
    gateway: Arc<AuthGateway<U, S>>,
    platform: Platform,
    correlation_id: CorrelationId,
    query: CallbackQuery,
    headers: HeaderMap,
) -> WebResult<Response>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    if let Some(description) = &query.error_description {
        tracing::warn!(correlation_id = %correlation_id.0, %platform, %description, "Provider reported an error");
    }

    let params = CallbackParams {
        state_cookie: cookie_value(&headers, gateway.anti_forgery().cookie_name()),
        state: query.state,
        code: query.code,
        error: query.error,
    };

    // The nonce is single-use whatever the outcome
    let clear = [(header::SET_COOKIE, gateway.anti_forgery().clear_cookie())];

    let outcome = match gateway.complete_login(platform, params).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok((clear, AppError::from(e)).into_response()),
    };

    tracing::info!(
        correlation_id = %correlation_id.0,
        user_id = %outcome.user.id,
        is_new = outcome.is_new,
        "Session issued"
    );

    Ok((
        clear,
        Json(AccessTokenResponse {
            access_token: outcome.access_token,
        }),
    )
        .into_response())
}

/// Apple Music login and callback.
///
/// # Errors
///
/// Always 501.
#[allow(clippy::unused_async)]
pub async fn not_implemented() -> WebResult<Response> {
    Err(AppError::not_implemented("Apple Music login is not available"))
}
