//! Authentication domain types.
//!
//! Plain data shared by the gateway, the token service and the stores.
//! All types are `Clone` so they can cross task and store boundaries freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Platforms
// ═══════════════════════════════════════════════════════════════════════

/// Music platform acting as identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Spotify Accounts.
    Spotify,

    /// YouTube Music (Google Identity).
    #[serde(rename = "youtube_music")]
    YouTubeMusic,

    /// Apple Music. Routed but not implemented.
    AppleMusic,
}

impl Platform {
    /// Every platform, in routing order.
    pub const ALL: [Self; 3] = [Self::Spotify, Self::YouTubeMusic, Self::AppleMusic];

    /// Storage tag for this platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::YouTubeMusic => "youtube_music",
            Self::AppleMusic => "apple_music",
        }
    }

    /// URL slug used in `/auth/{slug}-login` and `/auth/{slug}-callback`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::YouTubeMusic => "youtube-music",
            Self::AppleMusic => "apple-music",
        }
    }

    /// Whether a login flow exists for this platform.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        !matches!(self, Self::AppleMusic)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AuthError;

    /// Accepts either the storage tag or the URL slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spotify" => Ok(Self::Spotify),
            "youtube_music" | "youtube-music" => Ok(Self::YouTubeMusic),
            "apple_music" | "apple-music" => Ok(Self::AppleMusic),
            other => Err(AuthError::ProviderNotSupported(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════

/// Internal identity record.
///
/// Exactly one `User` exists per normalized email, whichever platforms the
/// email has authenticated through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,

    /// Display name taken from the first provider profile.
    pub username: String,

    /// Email address (lower-cased, trimmed, unique).
    pub email: String,

    /// Platform the user first registered through.
    pub platform: Platform,

    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user record for a first-time login.
    #[must_use]
    pub fn new(username: String, email: String, platform: Platform) -> Self {
        Self {
            id: UserId::new(),
            username,
            email,
            platform,
            created_at: Utc::now(),
        }
    }
}

/// Tokens returned by a provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    /// Access token for provider API calls.
    pub access_token: String,

    /// Refresh token (provider-dependent).
    pub refresh_token: Option<String>,

    /// Access token expiration, when the provider reports one.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provider-agnostic profile of the authenticated end-user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Email address (mandatory).
    pub email: String,

    /// Display name.
    pub display_name: String,

    /// Provider's stable subject identifier.
    pub subject_id: String,
}

/// Per-user, per-platform provider tokens.
///
/// At most one credential exists per `(user_id, platform)`; a new login on
/// the same platform overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    /// Owning user.
    pub user_id: UserId,

    /// Provider platform.
    pub platform: Platform,

    /// Provider subject identifier.
    pub subject_id: String,

    /// Provider access token.
    pub access_token: String,

    /// Provider refresh token (if any).
    pub refresh_token: Option<String>,

    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ProviderCredential {
    /// Bind freshly exchanged provider tokens to a user.
    #[must_use]
    pub fn from_login(
        user_id: UserId,
        platform: Platform,
        profile: &ProviderProfile,
        tokens: &ProviderTokens,
    ) -> Self {
        Self {
            user_id,
            platform,
            subject_id: profile.subject_id.clone(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            updated_at: Utc::now(),
        }
    }
}

/// Issued first-party session token.
///
/// `revoked` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Signed token value (unique).
    pub value: String,

    /// Owning user.
    pub user_id: UserId,

    /// Revocation flag.
    pub revoked: bool,

    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
}

/// Everything persisted by a successful login, written atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCommit {
    /// Provider credential to insert or overwrite.
    pub credential: ProviderCredential,

    /// Revoke every outstanding session token of the user before inserting.
    pub revoke_prior: bool,

    /// New session token.
    pub token: SessionToken,
}
