//! Router configuration for the Playsync server.
//!
//! Builds the complete Axum router with all endpoints.

use axum::{Router, routing::get};
use http::{HeaderValue, Method, header};
use playsync_auth::{AuthGateway, SessionStore, UserRepository, api_router, auth_router};
use playsync_web::handlers::health_check;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// - `/health` (no authentication)
/// - `/auth/*` and `/refresh-token` from [`auth_router`]
/// - `/api/*` behind the session guard from [`api_router`]
///
/// CORS admits `allowed_origin` with credentials, so the front-end can send
/// the anti-forgery cookie and the `Authorization` header.
pub fn build_router<U, S>(gateway: Arc<AuthGateway<U, S>>, allowed_origin: &HeaderValue) -> Router
where
    U: UserRepository + Clone + 'static,
    S: SessionStore + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router(gateway.clone()))
        .nest("/api", api_router(gateway))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
