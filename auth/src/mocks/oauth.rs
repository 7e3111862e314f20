//! Mock provider adapter for testing.

use async_trait::async_trait;

use crate::error::{AuthError, Result};
use crate::providers::ProviderAdapter;
use crate::state::{Platform, ProviderProfile, ProviderTokens};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Failure to inject into a [`MockProviderAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockFailure {
    /// Every call succeeds.
    #[default]
    None,
    /// `exchange_code` fails.
    Exchange,
    /// `fetch_profile` fails.
    Profile,
    /// `fetch_profile` returns a profile without email.
    MissingEmail,
    /// `refresh_access_token` fails.
    Refresh,
}

/// Mock provider adapter.
///
/// Each successful exchange returns a distinct access token
/// (`{platform}-access-{n}`) so overwrites are observable.
#[derive(Debug, Clone)]
pub struct MockProviderAdapter {
    platform: Platform,
    profile: Arc<Mutex<ProviderProfile>>,
    failure: Arc<Mutex<MockFailure>>,
    issue_refresh_token: bool,
    exchanges: Arc<AtomicUsize>,
}

impl MockProviderAdapter {
    /// Mock for `platform` authenticating `email`.
    #[must_use]
    pub fn new(platform: Platform, email: &str) -> Self {
        Self {
            platform,
            profile: Arc::new(Mutex::new(ProviderProfile {
                email: email.to_string(),
                display_name: "Test User".to_string(),
                subject_id: format!("{platform}-subject"),
            })),
            failure: Arc::new(Mutex::new(MockFailure::None)),
            issue_refresh_token: true,
            exchanges: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builder form of [`set_failure`](Self::set_failure).
    #[must_use]
    pub fn failing(self, failure: MockFailure) -> Self {
        self.set_failure(failure);
        self
    }

    /// Omit the refresh token from exchanges (Google re-consent behavior).
    #[must_use]
    pub const fn without_refresh_token(mut self) -> Self {
        self.issue_refresh_token = false;
        self
    }

    /// Change the injected failure.
    pub fn set_failure(&self, failure: MockFailure) {
        if let Ok(mut current) = self.failure.lock() {
            *current = failure;
        }
    }

    /// Change the email the provider reports.
    pub fn set_email(&self, email: &str) {
        if let Ok(mut profile) = self.profile.lock() {
            profile.email = email.to_string();
        }
    }

    /// Number of code exchanges attempted.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    fn failure(&self) -> MockFailure {
        self.failure.lock().map(|f| *f).unwrap_or_default()
    }
}

#[async_trait]
impl ProviderAdapter for MockProviderAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let query = serde_urlencoded::to_string([("state", state), ("redirect_uri", redirect_uri)])
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok(format!("https://{}.example.com/authorize?{query}", self.platform.slug()))
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<ProviderTokens> {
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failure() == MockFailure::Exchange {
            return Err(AuthError::CodeExchangeFailed(format!("invalid_grant for {code}")));
        }

        Ok(ProviderTokens {
            access_token: format!("{}-access-{n}", self.platform),
            refresh_token: self
                .issue_refresh_token
                .then(|| format!("{}-refresh-{n}", self.platform)),
            expires_at: None,
        })
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<ProviderProfile> {
        match self.failure() {
            MockFailure::Profile => Err(AuthError::ProfileFetchFailed("503".to_string())),
            MockFailure::MissingEmail => Err(AuthError::MalformedProfile(
                "profile has no usable email".to_string(),
            )),
            _ => self
                .profile
                .lock()
                .map(|p| p.clone())
                .map_err(|_| AuthError::InternalError("mock profile lock poisoned".to_string())),
        }
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<ProviderTokens> {
        if self.failure() == MockFailure::Refresh {
            return Err(AuthError::ProviderTokenRefreshFailed("invalid_grant".to_string()));
        }
        Ok(ProviderTokens {
            access_token: format!("{}-refreshed-from-{refresh_token}", self.platform),
            refresh_token: None,
            expires_at: None,
        })
    }
}
