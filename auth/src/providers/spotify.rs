//! Spotify adapter.
//!
//! Spotify returns a refresh token on every authorization and expects the
//! access token as a `Bearer` header on the Web API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ProviderClientConfig;
use crate::error::{AuthError, Result};
use crate::providers::oauth::{OAuthClient, ProviderAdapter, normalize_profile, send};
use crate::state::{Platform, ProviderProfile, ProviderTokens};

/// Spotify Accounts adapter.
///
/// # Example
///
/// ```no_run
/// use playsync_auth::config::ProviderClientConfig;
/// use playsync_auth::providers::{SpotifyAdapter, http_client};
///
/// # fn main() -> playsync_auth::Result<()> {
/// let spotify = SpotifyAdapter::new(
///     ProviderClientConfig::spotify("client-id".to_string(), "client-secret".to_string()),
///     http_client(std::time::Duration::from_secs(10))?,
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SpotifyAdapter {
    client: OAuthClient,

    /// Ask Spotify to show the consent dialog even if already granted.
    ///
    /// Default: false
    show_dialog: bool,
}

impl SpotifyAdapter {
    /// Create a Spotify adapter sharing `http`.
    #[must_use]
    pub fn new(config: ProviderClientConfig, http: Client) -> Self {
        Self {
            client: OAuthClient::new(config, http),
            show_dialog: false,
        }
    }

    /// Force the consent dialog on every login.
    #[must_use]
    pub const fn with_show_dialog(mut self, show: bool) -> Self {
        self.show_dialog = show;
        self
    }
}

#[async_trait]
impl ProviderAdapter for SpotifyAdapter {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let extra: &[(&str, &str)] = if self.show_dialog {
            &[("show_dialog", "true")]
        } else {
            &[]
        };
        self.client.authorization_url(state, redirect_uri, extra)
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
                .bearer_auth(access_token),
        )
        .await
        .map_err(AuthError::ProfileFetchFailed)?;

        parse_profile(&body)
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<ProviderTokens> {
        self.client
            .refresh(refresh_token)
            .await
            .map_err(AuthError::ProviderTokenRefreshFailed)
    }
}

/// Spotify `GET /v1/me` response (fields we use).
#[derive(Debug, Deserialize)]
struct SpotifyUser {
    id: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
}

fn parse_profile(body: &[u8]) -> Result<ProviderProfile> {
    let user: SpotifyUser = serde_json::from_slice(body)
        .map_err(|e| AuthError::MalformedProfile(format!("spotify profile: {e}")))?;

    normalize_profile(Platform::Spotify, user.email, user.display_name, user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderEndpoints;

    fn adapter() -> SpotifyAdapter {
        SpotifyAdapter::new(
            ProviderClientConfig::spotify("cid".to_string(), "secret".to_string())
                .with_endpoints(ProviderEndpoints::spotify()),
            Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let url = adapter()
            .build_authorization_url("nonce-123", "http://localhost:8080/auth/spotify-callback")
            .unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("state=nonce-123"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("playlist-modify-private"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fspotify-callback"));
        assert!(!url.contains("show_dialog"));
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_show_dialog_flag() {
        let url = adapter()
            .with_show_dialog(true)
            .build_authorization_url("s", "http://cb")
            .unwrap();
        assert!(url.contains("show_dialog=true"));
    }

    #[test]
    fn test_parse_profile() {
        let profile = parse_profile(
            br#"{"id":"wizzler","display_name":"JM Wizzler","email":"Email@Example.com","country":"SE"}"#,
        )
        .unwrap();

        assert_eq!(profile.subject_id, "wizzler");
        assert_eq!(profile.display_name, "JM Wizzler");
        assert_eq!(profile.email, "Email@Example.com");
    }

    #[test]
    fn test_parse_profile_missing_email() {
        let result = parse_profile(br#"{"id":"wizzler","display_name":"JM"}"#);
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));
    }

    #[test]
    fn test_parse_profile_wrong_shape() {
        let result = parse_profile(br#"{"email": 42}"#);
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));

        let result = parse_profile(b"not json");
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));
    }
}
