//! Anti-forgery state for the OAuth redirect.
//!
//! A random nonce is placed both in a short-lived `HttpOnly` cookie and in the
//! provider authorization URL. The provider echoes it back on the callback;
//! the callback is accepted only when the echoed value equals the cookie.
//! Nothing is stored server-side.

use base64::Engine;

use crate::config::AuthConfig;
use crate::constants::STATE_NONCE_BYTES;
use crate::error::{AuthError, Result};

/// A freshly generated anti-forgery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiForgeryState {
    /// Nonce to embed in the authorization URL.
    pub value: String,

    /// `Set-Cookie` header value binding the nonce to the browser.
    pub cookie: String,
}

/// Issues and checks anti-forgery nonces.
#[derive(Debug, Clone)]
pub struct AntiForgeryStateManager {
    cookie_name: String,
    ttl_seconds: i64,
    secure: bool,
}

impl AntiForgeryStateManager {
    /// Build a manager from the shared configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            cookie_name: config.state_cookie_name.clone(),
            ttl_seconds: config.state_ttl_minutes.saturating_mul(60),
            secure: config.secure_cookies,
        }
    }

    /// Name of the state cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Generate a new nonce (256 bits, base64url) and its cookie.
    #[must_use]
    pub fn generate_state(&self) -> AntiForgeryState {
        let bytes: [u8; STATE_NONCE_BYTES] = rand::random();
        let value = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        let cookie = self.cookie(&value, self.ttl_seconds);

        AntiForgeryState { value, cookie }
    }

    /// Validate the echoed `state` against the cookie value.
    ///
    /// Succeeds iff both are present, non-empty and byte-equal. The
    /// comparison runs in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] on any mismatch, including a
    /// missing cookie or missing query parameter.
    pub fn validate_state(&self, cookie_value: Option<&str>, echoed: Option<&str>) -> Result<()> {
        let (Some(cookie_value), Some(echoed)) = (cookie_value, echoed) else {
            return Err(AuthError::InvalidState);
        };

        if cookie_value.is_empty() || echoed.is_empty() {
            return Err(AuthError::InvalidState);
        }

        if constant_time_eq::constant_time_eq(cookie_value.as_bytes(), echoed.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidState)
        }
    }

    /// `Set-Cookie` value that removes the state cookie once consumed.
    #[must_use]
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={value}; Path=/auth; Max-Age={max_age}; HttpOnly; SameSite=Lax",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn manager() -> AntiForgeryStateManager {
        AntiForgeryStateManager::new(&AuthConfig::default())
    }

    #[test]
    fn test_generated_state_is_unique_and_in_cookie() {
        let manager = manager();
        let a = manager.generate_state();
        let b = manager.generate_state();

        assert_ne!(a.value, b.value);
        assert!(a.cookie.starts_with(&format!("oauthstate={}", a.value)));
        assert!(a.cookie.contains("HttpOnly"));
        assert!(a.cookie.contains("Max-Age=1200"));
        assert!(a.cookie.contains("Secure"));
        // 32 bytes, unpadded base64
        assert_eq!(a.value.len(), 43);
    }

    #[test]
    fn test_matching_state_validates() {
        let manager = manager();
        let state = manager.generate_state();

        assert!(manager
            .validate_state(Some(&state.value), Some(&state.value))
            .is_ok());
    }

    #[test]
    fn test_mismatch_fails_closed() {
        let manager = manager();

        assert_eq!(
            manager.validate_state(Some("xyz"), Some("abc")),
            Err(AuthError::InvalidState)
        );
        assert_eq!(
            manager.validate_state(None, Some("abc")),
            Err(AuthError::InvalidState)
        );
        assert_eq!(
            manager.validate_state(Some("abc"), None),
            Err(AuthError::InvalidState)
        );
        assert_eq!(
            manager.validate_state(Some(""), Some("")),
            Err(AuthError::InvalidState)
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let manager = AntiForgeryStateManager::new(
            &AuthConfig::default().with_secure_cookies(false),
        );
        let cookie = manager.clear_cookie();

        assert!(cookie.starts_with("oauthstate=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    proptest! {
        #[test]
        fn prop_validates_iff_equal_and_non_empty(a in ".{0,48}", b in ".{0,48}") {
            let result = manager().validate_state(Some(&a), Some(&b));
            prop_assert_eq!(result.is_ok(), !a.is_empty() && a == b);
        }

        #[test]
        fn prop_same_value_always_validates(v in "[A-Za-z0-9_-]{1,64}") {
            prop_assert!(manager().validate_state(Some(&v), Some(&v)).is_ok());
        }
    }
}
