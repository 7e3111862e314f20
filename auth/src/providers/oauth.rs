//! Provider adapter trait and the OAuth plumbing shared by its implementations.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::config::{ProviderClientConfig, ProviderEndpoints};
use crate::error::{AuthError, Result};
use crate::state::{Platform, ProviderProfile, ProviderTokens};

/// One identity provider.
///
/// Every platform normalizes its wire format into [`ProviderTokens`] and
/// [`ProviderProfile`], so the gateway is written once against this trait.
/// Adapters are held as `Arc<dyn ProviderAdapter>`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Platform served by this adapter.
    fn platform(&self) -> Platform;

    /// Build the consent-screen URL carrying `state` and the required scopes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the query cannot be encoded.
    fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String>;

    /// Exchange an authorization code for provider tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CodeExchangeFailed`] on transport failure,
    /// timeout, a non-2xx answer or an unreadable body.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderTokens>;

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProfileFetchFailed`]: transport failure or non-2xx
    /// - [`AuthError::MalformedProfile`]: body lacks an email or subject id
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile>;

    /// Obtain a new access token with a stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProviderTokenRefreshFailed`] on any failure.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<ProviderTokens>;
}

/// Build the HTTP client shared by every adapter.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if the TLS backend cannot initialize.
pub fn http_client(timeout: std::time::Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AuthError::InternalError(format!("Failed to build HTTP client: {e}")))
}

/// Authorization-code client shared by the concrete adapters.
#[derive(Clone)]
pub(crate) struct OAuthClient {
    pub(crate) client_id: String,
    client_secret: String,
    pub(crate) endpoints: ProviderEndpoints,
    scopes: Vec<String>,
    http: Client,
}

impl OAuthClient {
    pub(crate) fn new(config: ProviderClientConfig, http: Client) -> Self {
        Self {
            client_id: config.client_id,
            client_secret: config.client_secret,
            endpoints: config.endpoints,
            scopes: config.scopes,
            http,
        }
    }

    pub(crate) const fn http(&self) -> &Client {
        &self.http
    }

    /// Authorization URL with the standard parameters plus `extra`.
    pub(crate) fn authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let scope = self.scopes.join(" ");
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        params.extend_from_slice(extra);

        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| AuthError::InternalError(format!("Failed to build URL: {e}")))?;

        Ok(format!("{}?{query}", self.endpoints.authorize_url))
    }

    /// `grant_type=authorization_code` request.
    ///
    /// The error string is diagnostic only and already logged.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> std::result::Result<ProviderTokens, String> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// `grant_type=refresh_token` request.
    pub(crate) async fn refresh(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<ProviderTokens, String> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(
        &self,
        grant: &[(&str, &str)],
    ) -> std::result::Result<ProviderTokens, String> {
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        params.extend_from_slice(grant);

        let body = send(self.http.post(&self.endpoints.token_url).form(&params)).await?;

        let token: TokenEndpointResponse = serde_json::from_slice(&body)
            .map_err(|e| format!("unreadable token response: {e}"))?;

        Ok(token.into_tokens())
    }
}

/// Send a request and return the body of a 2xx answer.
///
/// Non-2xx bodies are logged and replaced by the status code.
pub(crate) async fn send(request: RequestBuilder) -> std::result::Result<Vec<u8>, String> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            "provider request timed out".to_string()
        } else {
            format!("provider request failed: {e}")
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        tracing::error!(%status, body = %error_body, "Provider request rejected");
        return Err(format!("provider answered {status}"));
    }

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| format!("failed to read provider response: {e}"))
}

/// Token endpoint response, identical for Spotify and Google.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,

    /// Lifetime in seconds (typically 3600).
    expires_in: Option<u32>,

    /// Present on the first authorization (Google only with `access_type=offline`).
    refresh_token: Option<String>,
}

impl TokenEndpointResponse {
    fn into_tokens(self) -> ProviderTokens {
        let expires_at = self
            .expires_in
            .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(i64::from(secs)));

        ProviderTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
        }
    }
}

/// Assemble a profile from optional wire fields.
///
/// Email and subject id are mandatory; a missing display name falls back to
/// the subject id.
pub(crate) fn normalize_profile(
    platform: Platform,
    email: Option<String>,
    display_name: Option<String>,
    subject_id: Option<String>,
) -> Result<ProviderProfile> {
    let email = email
        .map(|e| e.trim().to_string())
        .filter(|e| crate::utils::is_valid_email(e))
        .ok_or_else(|| AuthError::MalformedProfile(format!("{platform} profile has no usable email")))?;

    let subject_id = subject_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::MalformedProfile(format!("{platform} profile has no id")))?;

    let display_name = display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| subject_id.clone());

    Ok(ProviderProfile {
        email,
        display_name,
        subject_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_drops_empty_refresh_token() {
        let raw: TokenEndpointResponse = serde_json::from_str(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":3600,"refresh_token":""}"#,
        )
        .unwrap();

        let tokens = raw.into_tokens();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token, None);
        assert!(tokens.expires_at.is_some());
    }

    #[test]
    fn test_token_response_rejects_out_of_range_lifetime() {
        let raw = serde_json::from_str::<TokenEndpointResponse>(
            r#"{"access_token":"at","expires_in":9223372036854775807}"#,
        );
        assert!(raw.is_err());

        let raw: TokenEndpointResponse =
            serde_json::from_str(r#"{"access_token":"at","expires_in":4294967295}"#).unwrap();
        assert!(raw.into_tokens().expires_at.is_some());
    }

    #[test]
    fn test_profile_without_email_is_malformed() {
        let result = normalize_profile(Platform::Spotify, None, Some("A".into()), Some("id".into()));
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));

        let result = normalize_profile(
            Platform::Spotify,
            Some("   ".into()),
            Some("A".into()),
            Some("id".into()),
        );
        assert!(matches!(result, Err(AuthError::MalformedProfile(_))));
    }

    #[test]
    fn test_profile_display_name_falls_back_to_subject() {
        let profile = normalize_profile(
            Platform::YouTubeMusic,
            Some("a@x.com".into()),
            None,
            Some("1101".into()),
        )
        .unwrap();

        assert_eq!(profile.display_name, "1101");
        assert_eq!(profile.email, "a@x.com");
    }
}
