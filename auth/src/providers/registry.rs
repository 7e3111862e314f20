//! Provider lookup by platform.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AuthConfig, ProviderClientConfig};
use crate::error::{AuthError, Result};
use crate::providers::oauth::{ProviderAdapter, http_client};
use crate::providers::spotify::SpotifyAdapter;
use crate::providers::youtube_music::YouTubeMusicAdapter;
use crate::state::Platform;

/// Configured provider adapters, keyed by platform.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Platform, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from client configurations.
    ///
    /// A platform without configuration stays disabled. Both adapters share
    /// one HTTP client bounded by `config.provider_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AuthConfig,
        spotify: Option<ProviderClientConfig>,
        youtube_music: Option<ProviderClientConfig>,
    ) -> Result<Self> {
        let http = http_client(config.provider_timeout)?;
        let mut registry = Self::new();

        if let Some(spotify) = spotify {
            registry.register(Arc::new(SpotifyAdapter::new(spotify, http.clone())));
        }
        if let Some(google) = youtube_music {
            registry.register(Arc::new(YouTubeMusicAdapter::new(google, http)));
        }

        Ok(registry)
    }

    /// Add (or replace) the adapter for its platform.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Adapter for `platform`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderNotSupported`]: platform has no login flow
    /// - [`AuthError::ProviderNotConfigured`]: platform has no client registration
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn ProviderAdapter>> {
        if !platform.is_implemented() {
            return Err(AuthError::ProviderNotSupported(platform.slug().to_string()));
        }
        self.adapters
            .get(&platform)
            .cloned()
            .ok_or(AuthError::ProviderNotConfigured)
    }

    /// Platforms with a configured adapter.
    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_provider_is_disabled() {
        let config = AuthConfig::default();
        let registry = ProviderRegistry::from_config(
            &config,
            Some(ProviderClientConfig::spotify("id".into(), "secret".into())),
            None,
        )
        .unwrap();

        assert_eq!(registry.platforms(), vec![Platform::Spotify]);
        assert!(registry.get(Platform::Spotify).is_ok());
        assert!(matches!(
            registry.get(Platform::YouTubeMusic),
            Err(AuthError::ProviderNotConfigured)
        ));
    }

    #[test]
    fn test_apple_music_is_not_supported() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.get(Platform::AppleMusic),
            Err(AuthError::ProviderNotSupported(_))
        ));
    }
}
