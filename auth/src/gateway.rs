//! Login orchestration.
//!
//! [`AuthGateway`] binds the anti-forgery manager, the provider adapters, the
//! identity resolver and the token service into the two redirect exchanges
//! and the bearer-token check. It holds no mutable state of its own.

use std::fmt;
use std::sync::Arc;

use crate::anti_forgery::AntiForgeryStateManager;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::identity::IdentityResolver;
use crate::providers::{ProviderRegistry, SessionStore, UserRepository};
use crate::state::{Platform, ProviderCredential, User, UserId};
use crate::token::{TokenService, TokenSigner};

/// Stages of one login attempt, in order. Used to label failures in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Callback arrived; provider lookup.
    CallbackReceived,
    /// Anti-forgery state compared with the cookie.
    StateValidated,
    /// Authorization code exchanged for provider tokens.
    CodeExchanged,
    /// Provider profile fetched and parsed.
    ProfileFetched,
    /// Email mapped to an internal user.
    IdentityResolved,
    /// Credential stored, prior tokens revoked, new token persisted.
    Persisted,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CallbackReceived => "callback_received",
            Self::StateValidated => "state_validated",
            Self::CodeExchanged => "code_exchanged",
            Self::ProfileFetched => "profile_fetched",
            Self::IdentityResolved => "identity_resolved",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Result of [`AuthGateway::begin_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Provider consent URL to redirect the browser to.
    pub url: String,

    /// `Set-Cookie` value carrying the anti-forgery state.
    pub set_cookie: String,
}

/// Raw inputs of a provider callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Value of the anti-forgery cookie, if the browser sent it.
    pub state_cookie: Option<String>,

    /// `state` query parameter echoed by the provider.
    pub state: Option<String>,

    /// `code` query parameter.
    pub code: Option<String>,

    /// `error` query parameter (user denied consent, etc.).
    pub error: Option<String>,
}

/// Result of a successful [`AuthGateway::complete_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// New session token.
    pub access_token: String,

    /// Resolved user.
    pub user: User,

    /// Whether the user was created by this login.
    pub is_new: bool,

    /// Number of prior session tokens revoked.
    pub revoked: u64,
}

/// Orchestrates login, callback, authentication and refresh.
pub struct AuthGateway<U, S> {
    config: Arc<AuthConfig>,
    providers: ProviderRegistry,
    anti_forgery: AntiForgeryStateManager,
    identity: IdentityResolver<U>,
    tokens: TokenService<U, S>,
}

impl<U, S> AuthGateway<U, S>
where
    U: UserRepository + Clone,
    S: SessionStore,
{
    /// Wire the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if `config` does not validate.
    pub fn new(
        config: Arc<AuthConfig>,
        providers: ProviderRegistry,
        users: U,
        sessions: S,
    ) -> Result<Self> {
        config.validate()?;
        let signer = TokenSigner::new(&config.token_secret)?;

        Ok(Self {
            anti_forgery: AntiForgeryStateManager::new(&config),
            identity: IdentityResolver::new(users.clone()),
            tokens: TokenService::new(users, sessions, signer, config.session_ttl),
            providers,
            config,
        })
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Anti-forgery manager (cookie name, clearing cookie).
    #[must_use]
    pub const fn anti_forgery(&self) -> &AntiForgeryStateManager {
        &self.anti_forgery
    }

    /// Token service.
    #[must_use]
    pub const fn tokens(&self) -> &TokenService<U, S> {
        &self.tokens
    }

    /// Start a login: fresh state, cookie and provider consent URL.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderNotSupported`] / [`AuthError::ProviderNotConfigured`]
    /// - [`AuthError::InternalError`]: URL encoding failed
    pub fn begin_login(&self, platform: Platform) -> Result<LoginRedirect> {
        let adapter = self.providers.get(platform)?;
        let state = self.anti_forgery.generate_state();
        let url =
            adapter.build_authorization_url(&state.value, &self.config.redirect_uri(platform))?;

        tracing::debug!(%platform, "Issued login redirect");

        Ok(LoginRedirect {
            url,
            set_cookie: state.cookie,
        })
    }

    /// Complete a login from the provider callback.
    ///
    /// Stages run strictly in order and the first failure aborts the attempt.
    /// Nothing is written before [`LoginStage::Persisted`], and that write is
    /// a single transaction, so a failed attempt leaves no session behind.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] raised by the failing stage.
    #[tracing::instrument(skip_all, fields(platform = %platform))]
    pub async fn complete_login(
        &self,
        platform: Platform,
        params: CallbackParams,
    ) -> Result<LoginOutcome> {
        let adapter = self
            .providers
            .get(platform)
            .map_err(failed(LoginStage::CallbackReceived))?;

        self.anti_forgery
            .validate_state(params.state_cookie.as_deref(), params.state.as_deref())
            .map_err(failed(LoginStage::StateValidated))?;

        if let Some(error) = params.error {
            return Err(failed(LoginStage::CodeExchanged)(AuthError::CodeExchangeFailed(
                format!("provider returned error: {error}"),
            )));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::CodeExchangeFailed("missing code".to_string()))
            .map_err(failed(LoginStage::CodeExchanged))?;

        let redirect_uri = self.config.redirect_uri(platform);
        let provider_tokens = adapter
            .exchange_code(&code, &redirect_uri)
            .await
            .map_err(failed(LoginStage::CodeExchanged))?;

        let profile = adapter
            .fetch_profile(&provider_tokens.access_token)
            .await
            .map_err(failed(LoginStage::ProfileFetched))?;

        let (user, is_new) = self
            .identity
            .resolve(&profile.email, &profile.display_name, platform)
            .await
            .map_err(failed(LoginStage::IdentityResolved))?;

        let mut credential =
            ProviderCredential::from_login(user.id, platform, &profile, &provider_tokens);
        if credential.refresh_token.is_none() && !is_new {
            credential.refresh_token = self
                .tokens
                .sessions()
                .get_credential(user.id, platform)
                .await
                .map_err(failed(LoginStage::Persisted))?
                .and_then(|previous| previous.refresh_token);
        }

        let (access_token, revoked) = self
            .tokens
            .commit_login(credential, !is_new)
            .await
            .map_err(failed(LoginStage::Persisted))?;

        tracing::info!(user_id = %user.id, is_new, revoked, "Login completed");

        Ok(LoginOutcome {
            access_token,
            user,
            is_new,
            revoked,
        })
    }

    /// Resolve the user behind a bearer token.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] for any unusable token.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<User> {
        self.tokens.validate(token).await
    }

    /// Revoke the presenting token only. Other sessions of the user survive.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] if the token is not currently valid.
    pub async fn logout(&self, token: Option<&str>) -> Result<User> {
        let user = self.tokens.validate(token).await?;
        if let Some(token) = token {
            self.tokens.revoke(token).await?;
        }
        tracing::info!(user_id = %user.id, "Logged out");
        Ok(user)
    }

    /// Issue an additional session token for a known user.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] for an unknown id.
    pub async fn refresh_session(&self, user_id: UserId) -> Result<String> {
        self.tokens.refresh_session(user_id).await
    }

    /// Refresh the stored provider access token through the provider.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ProviderTokenRefreshFailed`]: no credential, no refresh
    ///   token, or the provider refused
    /// - [`AuthError::PersistenceFailure`]: store failure
    pub async fn renew_provider_credential(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<()> {
        let adapter = self.providers.get(platform)?;
        let credential = self
            .tokens
            .sessions()
            .get_credential(user_id, platform)
            .await?
            .ok_or_else(|| {
                AuthError::ProviderTokenRefreshFailed(format!("no {platform} credential on record"))
            })?;
        let refresh_token = credential.refresh_token.clone().ok_or_else(|| {
            AuthError::ProviderTokenRefreshFailed("no refresh token on record".to_string())
        })?;

        let fresh = adapter.refresh_access_token(&refresh_token).await?;

        match fresh.refresh_token {
            Some(rotated) if rotated != refresh_token => {
                let updated = ProviderCredential {
                    access_token: fresh.access_token,
                    refresh_token: Some(rotated),
                    updated_at: chrono::Utc::now(),
                    ..credential
                };
                self.tokens.sessions().upsert_credential(&updated).await?;
            }
            _ => {
                self.tokens
                    .refresh_provider_token(user_id, platform, &fresh.access_token)
                    .await?;
            }
        }

        tracing::info!(%user_id, %platform, "Provider access token renewed");
        Ok(())
    }
}

impl<U, S> fmt::Debug for AuthGateway<U, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGateway")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

fn failed(stage: LoginStage) -> impl Fn(AuthError) -> AuthError {
    move |error| {
        if error.is_security_issue() {
            tracing::warn!(%stage, %error, "Login rejected");
        } else if error.is_provider_failure() {
            tracing::warn!(%stage, %error, "Provider call failed");
        } else if error.is_user_error() {
            tracing::debug!(%stage, %error, "Login refused");
        } else {
            tracing::error!(%stage, %error, "Login failed");
        }
        error
    }
}
