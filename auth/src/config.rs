//! Authentication configuration.
//!
//! Configuration is built once at process start, wrapped in an `Arc` and
//! handed to the gateway and the provider adapters. Nothing in this crate
//! reads the environment directly.

use chrono::Duration;

use crate::constants::{MIN_TOKEN_SECRET_LEN, STATE_COOKIE_NAME};
use crate::error::{AuthError, Result};
use crate::state::Platform;

/// Login and session configuration shared by every platform.
#[derive(Clone)]
pub struct AuthConfig {
    /// Public base URL of this service (e.g., "https://api.example.com").
    ///
    /// Callback URIs are formatted as `{base_url}/auth/{slug}-callback`.
    pub base_url: String,

    /// Name of the cookie carrying the anti-forgery state.
    ///
    /// Default: `oauthstate`
    pub state_cookie_name: String,

    /// Anti-forgery cookie lifetime in minutes.
    ///
    /// Default: 20 minutes
    pub state_ttl_minutes: i64,

    /// Session token lifetime. `None` means tokens only end by revocation.
    ///
    /// Default: 24 hours
    pub session_ttl: Option<Duration>,

    /// HMAC key used to sign session tokens.
    pub token_secret: Vec<u8>,

    /// Upper bound for every provider HTTP call.
    ///
    /// Default: 10 seconds
    pub provider_timeout: std::time::Duration,

    /// Whether cookies carry the `Secure` attribute.
    ///
    /// Default: `true`
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Create new authentication configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Public base URL of the service
    /// * `token_secret` - Session token signing key (at least 32 bytes)
    #[must_use]
    pub fn new(base_url: String, token_secret: Vec<u8>) -> Self {
        Self {
            base_url,
            token_secret,
            ..Self::default()
        }
    }

    /// Set anti-forgery cookie lifetime.
    #[must_use]
    pub const fn with_state_ttl(mut self, minutes: i64) -> Self {
        self.state_ttl_minutes = minutes;
        self
    }

    /// Set session token lifetime (`None` disables expiry).
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set provider call timeout.
    #[must_use]
    pub const fn with_provider_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Toggle the `Secure` cookie attribute (disable for plain-HTTP development).
    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Set the anti-forgery cookie name.
    #[must_use]
    pub fn with_state_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.state_cookie_name = name.into();
        self
    }

    /// Callback URI registered with the provider for `platform`.
    #[must_use]
    pub fn redirect_uri(&self, platform: Platform) -> String {
        format!(
            "{}/auth/{}-callback",
            self.base_url.trim_end_matches('/'),
            platform.slug()
        )
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] when the signing key is shorter
    /// than 32 bytes or the base URL is empty.
    pub fn validate(&self) -> Result<()> {
        if self.token_secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(AuthError::InternalError(format!(
                "token secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
            )));
        }
        if self.base_url.is_empty() {
            return Err(AuthError::InternalError("base URL is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            state_cookie_name: STATE_COOKIE_NAME.to_string(),
            state_ttl_minutes: 20,
            session_ttl: Some(Duration::hours(24)),
            token_secret: Vec::new(),
            provider_timeout: std::time::Duration::from_secs(10),
            secure_cookies: true,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("base_url", &self.base_url)
            .field("state_cookie_name", &self.state_cookie_name)
            .field("state_ttl_minutes", &self.state_ttl_minutes)
            .field("session_ttl", &self.session_ttl)
            .field("token_secret", &"[REDACTED]")
            .field("provider_timeout", &self.provider_timeout)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

/// Provider endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Authorization (consent screen) endpoint.
    pub authorize_url: String,

    /// Token endpoint (code exchange and refresh).
    pub token_url: String,

    /// Profile endpoint.
    pub profile_url: String,
}

impl ProviderEndpoints {
    /// Spotify Accounts and Web API endpoints.
    #[must_use]
    pub fn spotify() -> Self {
        Self {
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            profile_url: "https://api.spotify.com/v1/me".to_string(),
        }
    }

    /// Google Identity endpoints used for YouTube Music.
    #[must_use]
    pub fn google() -> Self {
        Self {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            profile_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }

    /// Point every endpoint at `base` (used against local stub servers).
    #[must_use]
    pub fn at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/authorize"),
            token_url: format!("{base}/token"),
            profile_url: format!("{base}/profile"),
        }
    }
}

/// OAuth client registration for one platform.
#[derive(Clone)]
pub struct ProviderClientConfig {
    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Endpoint URLs.
    pub endpoints: ProviderEndpoints,

    /// Requested scopes.
    pub scopes: Vec<String>,
}

impl ProviderClientConfig {
    /// Spotify client with the default endpoints and playlist scopes.
    #[must_use]
    pub fn spotify(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            endpoints: ProviderEndpoints::spotify(),
            scopes: [
                "user-read-email",
                "user-read-private",
                "playlist-read-private",
                "playlist-modify-private",
                "playlist-modify-public",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }

    /// Google client with the default endpoints and YouTube scopes.
    #[must_use]
    pub fn google(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            endpoints: ProviderEndpoints::google(),
            scopes: [
                "https://www.googleapis.com/auth/userinfo.email",
                "https://www.googleapis.com/auth/userinfo.profile",
                "https://www.googleapis.com/auth/youtube",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }

    /// Override endpoint URLs.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

impl std::fmt::Debug for ProviderClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_builder() {
        let config = AuthConfig::new("https://example.com".to_string(), vec![7; 32])
            .with_state_ttl(5)
            .with_session_ttl(None)
            .with_secure_cookies(false)
            .with_state_cookie_name("ps_state");

        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.state_ttl_minutes, 5);
        assert_eq!(config.session_ttl, None);
        assert!(!config.secure_cookies);
        assert_eq!(config.state_cookie_name, "ps_state");
        assert_eq!(AuthConfig::default().state_cookie_name, "oauthstate");
    }

    #[test]
    fn test_scopes_can_be_narrowed() {
        let config = ProviderClientConfig::spotify("id".to_string(), "secret".to_string())
            .with_scopes(vec!["user-read-email".to_string()]);

        assert_eq!(config.scopes, ["user-read-email"]);
        assert_eq!(config.endpoints, ProviderEndpoints::spotify());
    }

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();

        assert_eq!(config.state_ttl_minutes, 20);
        assert_eq!(config.session_ttl, Some(Duration::hours(24)));
        assert_eq!(config.provider_timeout, std::time::Duration::from_secs(10));
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_redirect_uri_uses_platform_slug() {
        let config = AuthConfig::new("https://api.example.com/".to_string(), vec![0; 32]);

        assert_eq!(
            config.redirect_uri(Platform::YouTubeMusic),
            "https://api.example.com/auth/youtube-music-callback"
        );
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let config = AuthConfig::new("https://example.com".to_string(), b"short".to_vec());
        assert!(config.validate().is_err());

        let config = AuthConfig::new("https://example.com".to_string(), vec![1; 32]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AuthConfig::new("https://example.com".to_string(), b"super-secret".to_vec());
        assert!(!format!("{config:?}").contains("super-secret"));

        let client = ProviderClientConfig::spotify("id".to_string(), "hunter2".to_string());
        assert!(!format!("{client:?}").contains("hunter2"));
    }
}
