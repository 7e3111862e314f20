//! YouTube Music adapter (Google Identity).
//!
//! Google only issues a refresh token with `access_type=offline`, and the
//! v2 userinfo endpoint takes the access token as a query parameter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ProviderClientConfig;
use crate::error::{AuthError, Result};
use crate::providers::oauth::{OAuthClient, ProviderAdapter, normalize_profile, send};
use crate::state::{Platform, ProviderProfile, ProviderTokens};

/// Google OAuth adapter for YouTube Music.
#[derive(Clone)]
pub struct YouTubeMusicAdapter {
    client: OAuthClient,

    /// Request a refresh token for offline access.
    ///
    /// Default: true
    request_refresh_token: bool,

    /// Force the consent screen on every authorization.
    ///
    /// Default: false
    force_consent: bool,
}

impl YouTubeMusicAdapter {
    /// Create a YouTube Music adapter sharing `http`.
    #[must_use]
    pub fn new(config: ProviderClientConfig, http: Client) -> Self {
        Self {
            client: OAuthClient::new(config, http),
            request_refresh_token: true,
            force_consent: false,
        }
    }

    /// Request refresh token for offline access.
    #[must_use]
    pub const fn with_refresh_token(mut self, request: bool) -> Self {
        self.request_refresh_token = request;
        self
    }

    /// Force consent screen on every authorization.
    #[must_use]
    pub const fn with_force_consent(mut self, force: bool) -> Self {
        self.force_consent = force;
        self
    }
}

#[async_trait]
impl ProviderAdapter for YouTubeMusicAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTubeMusic
    }

    fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let mut extra = Vec::with_capacity(2);
        if self.request_refresh_token {
            extra.push(("access_type", "offline"));
        }
        if self.force_consent {
            extra.push(("prompt", "consent"));
        }
        self.client.authorization_url(state, redirect_uri, &extra)
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderTokens> {
        self.client
            .exchange_code(code, redirect_uri)
            .await
            .map_err(AuthError::CodeExchangeFailed)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile> {
        let body = send(
            self.client
                .http()
                .get(&self.client.endpoints.profile_url)
                .query(&[("access_token", access_token)]),
        )
        .await
        .map_err(AuthError::ProfileFetchFailed)?;

        parse_profile(&body)
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<ProviderTokens> {
        let mut tokens = self
            .client
            .refresh(refresh_token)
            .await
            .map_err(AuthError::ProviderTokenRefreshFailed)?;

        // Google keeps the original refresh token valid and omits it here
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }
}

/// Google `oauth2/v2/userinfo` response (fields we use).
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    /// Google account id (stable).
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

fn parse_profile(body: &[u8]) -> Result<ProviderProfile> {
    let user: GoogleUserInfo = serde_json::from_slice(body)
        .map_err(|e| AuthError::MalformedProfile(format!("google userinfo: {e}")))?;

    normalize_profile(Platform::YouTubeMusic, user.email, user.name, user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> YouTubeMusicAdapter {
        YouTubeMusicAdapter::new(
            ProviderClientConfig::google("gid".to_string(), "gsecret".to_string()),
            Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_requests_offline_access() {
        let url = adapter()
            .build_authorization_url("st", "http://localhost:8080/auth/youtube-music-callback")
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("state=st"));
        assert!(url.contains("youtube"));
        assert!(!url.contains("prompt=consent"));
    }

    #[test]
    fn test_authorization_url_options() {
        let url = adapter()
            .with_refresh_token(false)
            .with_force_consent(true)
            .build_authorization_url("st", "http://cb")
            .unwrap();

        assert!(!url.contains("access_type"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_parse_profile() {
        let profile = parse_profile(
            br#"{"id":"110169484474386276334","email":"a@x.com","verified_email":true,"name":"Ann"}"#,
        )
        .unwrap();

        assert_eq!(profile.subject_id, "110169484474386276334");
        assert_eq!(profile.display_name, "Ann");
        assert_eq!(profile.email, "a@x.com");
    }

    #[test]
    fn test_parse_profile_without_email_is_rejected() {
        let result = parse_profile(br#"{"id":"1","name":"Ann"}"#);
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));
    }
}
