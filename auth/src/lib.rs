//! # Playsync Authentication & Session Tokens
//!
//! This crate federates end-user login through music-platform identity
//! providers (Spotify, YouTube Music) and issues the first-party session
//! tokens used by the rest of the Playsync API.
//!
//! ## Components
//!
//! - [`anti_forgery::AntiForgeryStateManager`]: one-time `state` nonces bound
//!   to a short-lived cookie
//! - [`providers::ProviderAdapter`]: code exchange and profile fetch, one
//!   implementation per platform
//! - [`identity::IdentityResolver`]: email-keyed lookup-or-create of users
//! - [`token::TokenService`]: issue, validate, revoke and refresh session tokens
//! - [`providers::SessionStore`] / [`providers::UserRepository`]: persistence
//!   interfaces (Postgres behind the `postgres` feature, in-memory mocks
//!   behind `test-utils`)
//! - [`gateway::AuthGateway`]: orchestrates the login redirect, the callback
//!   and bearer-token authentication
//!
//! ## Login flow
//!
//! ```text
//! begin_login:    state nonce + cookie → provider consent URL
//! complete_login: CallbackReceived → StateValidated → CodeExchanged
//!                 → ProfileFetched → IdentityResolved → Persisted
//! ```
//!
//! Any failing stage aborts the attempt. `Persisted` stores the provider
//! credential, revokes the user's prior session tokens and inserts the new
//! one in a single store transaction.
//!
//! ## Example
//!
//! ```rust,ignore
//! use playsync_auth::{AuthConfig, AuthGateway, Platform};
//!
//! let gateway = AuthGateway::new(config, providers, users, sessions)?;
//!
//! // 1. Redirect the browser to the provider
//! let redirect = gateway.begin_login(Platform::Spotify)?;
//!
//! // 2. Provider redirects back with `code` and `state`
//! let outcome = gateway.complete_login(Platform::Spotify, callback).await?;
//!
//! // 3. Protected requests present the session token
//! let user = gateway.authenticate(Some(&outcome.access_token)).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod anti_forgery;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod providers;
pub mod state;
pub mod stores;
pub mod token;
pub mod utils;

#[cfg(feature = "test-utils")]
pub mod mocks;

#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "axum")]
pub mod router;

// Re-export main types for convenience
pub use config::{AuthConfig, ProviderClientConfig};
pub use error::{AuthError, Result};
pub use gateway::{AuthGateway, CallbackParams, LoginOutcome, LoginRedirect};
pub use providers::{ProviderAdapter, ProviderRegistry, SessionStore, UserRepository};
pub use state::{
    Platform, ProviderCredential, ProviderProfile, ProviderTokens, SessionToken, User, UserId,
};

#[cfg(feature = "axum")]
pub use router::{api_router, auth_router};
