//! Session guard for protected routes.
//!
//! # Usage
//!
//! ```rust,ignore
//! let api = Router::new()
//!     .route("/users/me", get(session::me))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         gateway.clone(),
//!         require_session::<U, S>,
//!     ));
//! ```

use crate::gateway::AuthGateway;
use crate::providers::{SessionStore, UserRepository};
use crate::state::User;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use playsync_web::{AppError, extractors::bearer_token};
use std::sync::Arc;

/// Validate the bearer token and attach the [`User`] to the request.
///
/// Runs on every protected request; nothing is mutated.
///
/// # Errors
///
/// 401 when the token is missing, malformed, revoked or expired.
pub async fn require_session<U, S>(
    State(gateway): State<Arc<AuthGateway<U, S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    let token = bearer_token(request.headers());
    let user = gateway.authenticate(token.as_deref()).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// User attached by [`require_session`].
///
/// Use as a handler parameter behind the guard.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))
    }
}
