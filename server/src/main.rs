//! Playsync HTTP server.
//!
//! Login federation through Spotify and YouTube Music, first-party session
//! tokens and the protected `/api` surface.

use anyhow::Context;
use http::HeaderValue;
use playsync_auth::stores::postgres::{self, PostgresSessionStore, PostgresUserRepository};
use playsync_auth::{AuthGateway, ProviderRegistry};
use playsync_server::{Config, build_router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playsync=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Playsync server");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        base_url = %config.auth.base_url,
        spotify = config.spotify.is_some(),
        youtube_music = config.google.is_some(),
        "Configuration loaded"
    );

    // Setup database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .connect(&config.postgres.url)
        .await
        .context("Failed to connect to database")?;
    postgres::migrate(&pool).await?;
    info!("Database ready");

    // Setup providers
    let auth_config = Arc::new(config.auth_config());
    let providers =
        ProviderRegistry::from_config(&auth_config, config.spotify_client(), config.google_client())?;
    if providers.platforms().is_empty() {
        warn!("No identity provider configured; every login will be rejected");
    }

    let gateway = Arc::new(AuthGateway::new(
        auth_config,
        providers,
        PostgresUserRepository::new(pool.clone()),
        PostgresSessionStore::new(pool),
    )?);

    // Build router
    let origin = HeaderValue::from_str(&config.cors_allowed_origin)
        .context("CORS_ALLOWED_ORIGIN is not a valid header value")?;
    let app = build_router(gateway, &origin);

    // Create TCP listener
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the corresponding branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
