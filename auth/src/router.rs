//! Authentication router composition.

use crate::gateway::AuthGateway;
use crate::handlers::{middleware::require_session, oauth, session};
use crate::providers::{SessionStore, UserRepository};
use crate::state::Platform;
use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use playsync_web::CorrelationId;
use std::sync::Arc;

/// Create the authentication router.
///
/// # Routes
///
/// ## OAuth (per platform slug: `spotify`, `youtube-music`, `apple-music`)
/// - `GET /auth/{slug}-login` - Redirect to provider consent screen
/// - `GET /auth/{slug}-callback` - Complete login, return `{accessToken}`
///
/// ## Session
/// - `POST /auth/logout` - Revoke the presenting token
/// - `POST /refresh-token` - Issue a new token for `{userId}`
///
/// # Example
///
/// ```rust,ignore
/// let gateway = Arc::new(AuthGateway::new(config, providers, users, sessions)?);
///
/// let app = Router::new()
///     .merge(auth_router(gateway.clone()))
///     .nest("/api", api_router(gateway))
///     .layer(TraceLayer::new_for_http());
/// ```
pub fn auth_router<U, S>(gateway: Arc<AuthGateway<U, S>>) -> Router
where
    U: UserRepository + Clone + 'static,
    S: SessionStore + 'static,
{
    Platform::ALL
        .into_iter()
        .fold(Router::new(), platform_routes::<U, S>)
        .route("/auth/logout", post(session::logout::<U, S>))
        .route("/refresh-token", post(session::refresh_token::<U, S>))
        .with_state(gateway)
}

/// Create the protected API router (mount under `/api`).
///
/// Every route passes through [`require_session`].
///
/// # Routes
///
/// - `GET /users/me` - Authenticated user
pub fn api_router<U, S>(gateway: Arc<AuthGateway<U, S>>) -> Router
where
    U: UserRepository + Clone + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/users/me", get(session::me))
        .route_layer(axum::middleware::from_fn_with_state(
            gateway.clone(),
            require_session::<U, S>,
        ))
        .with_state(gateway)
}

fn platform_routes<U, S>(
    router: Router<Arc<AuthGateway<U, S>>>,
    platform: Platform,
) -> Router<Arc<AuthGateway<U, S>>>
where
    U: UserRepository + Clone + 'static,
    S: SessionStore + 'static,
{
    let login_path = format!("/auth/{}-login", platform.slug());
    let callback_path = format!("/auth/{}-callback", platform.slug());

    if !platform.is_implemented() {
        return router
            .route(&login_path, get(oauth::not_implemented))
            .route(&callback_path, get(oauth::not_implemented));
    }

    router
        .route(
            &login_path,
            get(
                move |State(gateway): State<Arc<AuthGateway<U, S>>>, correlation_id: CorrelationId| {
                    oauth::login(gateway, platform, correlation_id)
                },
            ),
        )
        .route(
            &callback_path,
            get(
                move |State(gateway): State<Arc<AuthGateway<U, S>>>,
                      correlation_id: CorrelationId,
                      headers: HeaderMap,
                      Query(query): Query<oauth::CallbackQuery>| {
                    oauth::callback(gateway, platform, correlation_id, query, headers)
                },
            ),
        )
}
