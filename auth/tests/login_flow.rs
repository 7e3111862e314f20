//! Integration tests for the login flow, session lifecycle and identity
//! resolution, driven through [`AuthGateway`] with in-memory stores.

use futures::future::join_all;
use playsync_auth::{
    AuthConfig, AuthError, AuthGateway, CallbackParams, Platform, ProviderCredential,
    ProviderRegistry, SessionStore, User,
    identity::IdentityResolver,
    mocks::{MockFailure, MockProviderAdapter, MockSessionStore, MockUserRepository},
};
use std::sync::Arc;

const SECRET: &[u8] = b"login-flow-test-secret-0123456789abcdef";

type Gateway = AuthGateway<MockUserRepository, MockSessionStore>;

struct Harness {
    gateway: Arc<Gateway>,
    users: MockUserRepository,
    sessions: MockSessionStore,
    spotify: MockProviderAdapter,
    youtube: MockProviderAdapter,
}

/// Gateway with Spotify and YouTube Music mocks both authenticating `email`.
fn harness(email: &str) -> Harness {
    harness_with(
        MockProviderAdapter::new(Platform::Spotify, email),
        MockProviderAdapter::new(Platform::YouTubeMusic, email),
    )
}

fn harness_with(spotify: MockProviderAdapter, youtube: MockProviderAdapter) -> Harness {
    let users = MockUserRepository::new();
    let sessions = MockSessionStore::new();
    let providers = ProviderRegistry::new()
        .with(Arc::new(spotify.clone()))
        .with(Arc::new(youtube.clone()));
    let config = AuthConfig::new("https://api.playsync.test".to_string(), SECRET.to_vec());

    let gateway =
        AuthGateway::new(Arc::new(config), providers, users.clone(), sessions.clone()).unwrap();

    Harness {
        gateway: Arc::new(gateway),
        users,
        sessions,
        spotify,
        youtube,
    }
}

/// Callback parameters that pass the state check for a fresh redirect.
fn matching_callback(gateway: &Gateway, platform: Platform) -> CallbackParams {
    let redirect = gateway.begin_login(platform).unwrap();
    let state = cookie_state(&redirect.set_cookie);

    CallbackParams {
        state_cookie: Some(state.clone()),
        state: Some(state),
        code: Some("auth-code".to_string()),
        error: None,
    }
}

fn cookie_state(set_cookie: &str) -> String {
    let pair = set_cookie.split(';').next().unwrap();
    pair.split_once('=').unwrap().1.to_string()
}

async fn login(gateway: &Gateway, platform: Platform) -> playsync_auth::LoginOutcome {
    gateway
        .complete_login(platform, matching_callback(gateway, platform))
        .await
        .unwrap()
}

async fn credential(h: &Harness, user: &User, platform: Platform) -> Option<ProviderCredential> {
    h.sessions.get_credential(user.id, platform).await.unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Redirect
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_begin_login_binds_state_to_cookie() {
    let h = harness("a@x.com");

    let redirect = h.gateway.begin_login(Platform::Spotify).unwrap();
    let state = cookie_state(&redirect.set_cookie);

    assert!(redirect.set_cookie.starts_with("oauthstate="));
    assert!(redirect.set_cookie.contains("HttpOnly"));
    assert!(redirect.url.contains(&format!("state={state}")));
    assert!(redirect.url.contains("spotify-callback"));
}

#[tokio::test]
async fn test_every_redirect_gets_a_fresh_state() {
    let h = harness("a@x.com");

    let first = h.gateway.begin_login(Platform::Spotify).unwrap();
    let second = h.gateway.begin_login(Platform::Spotify).unwrap();

    assert_ne!(cookie_state(&first.set_cookie), cookie_state(&second.set_cookie));
}

#[tokio::test]
async fn test_apple_music_is_not_supported() {
    let h = harness("a@x.com");

    assert!(matches!(
        h.gateway.begin_login(Platform::AppleMusic),
        Err(AuthError::ProviderNotSupported(_))
    ));
    let result = h
        .gateway
        .complete_login(Platform::AppleMusic, CallbackParams::default())
        .await;
    assert!(matches!(result, Err(AuthError::ProviderNotSupported(_))));
}

#[tokio::test]
async fn test_unconfigured_platform_is_rejected() {
    let users = MockUserRepository::new();
    let providers = ProviderRegistry::new().with(Arc::new(MockProviderAdapter::new(
        Platform::Spotify,
        "a@x.com",
    )));
    let config = AuthConfig::new("https://api.playsync.test".to_string(), SECRET.to_vec());
    let gateway =
        AuthGateway::new(Arc::new(config), providers, users, MockSessionStore::new()).unwrap();

    assert_eq!(
        gateway.begin_login(Platform::YouTubeMusic),
        Err(AuthError::ProviderNotConfigured)
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Callback
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_first_login_creates_user_credential_and_one_session() {
    let h = harness("A@X.com");

    let outcome = login(&h.gateway, Platform::Spotify).await;

    assert!(outcome.is_new);
    assert_eq!(outcome.revoked, 0);
    assert_eq!(outcome.user.email, "a@x.com");
    assert_eq!(h.users.count(), 1);

    let stored = credential(&h, &outcome.user, Platform::Spotify).await.unwrap();
    assert_eq!(stored.access_token, "spotify-access-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("spotify-refresh-1"));

    assert_eq!(h.sessions.live_tokens(outcome.user.id).len(), 1);
    let user = h.gateway.authenticate(Some(&outcome.access_token)).await.unwrap();
    assert_eq!(user.id, outcome.user.id);
}

#[tokio::test]
async fn test_repeat_login_revokes_prior_sessions_and_overwrites_credential() {
    let h = harness("a@x.com");

    let first = login(&h.gateway, Platform::Spotify).await;
    let extra = h.gateway.refresh_session(first.user.id).await.unwrap();
    let second = login(&h.gateway, Platform::Spotify).await;

    assert!(!second.is_new);
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(second.revoked, 2);

    for old in [&first.access_token, &extra] {
        assert_eq!(
            h.gateway.authenticate(Some(old)).await,
            Err(AuthError::Unauthenticated)
        );
    }
    assert!(h.gateway.authenticate(Some(&second.access_token)).await.is_ok());
    assert_eq!(h.sessions.live_tokens(first.user.id).len(), 1);

    let stored = credential(&h, &second.user, Platform::Spotify).await.unwrap();
    assert_eq!(stored.access_token, "spotify-access-2");
    assert_eq!(h.sessions.credential_count(), 1);
}

#[tokio::test]
async fn test_same_email_on_second_platform_reuses_user() {
    let h = harness("a@x.com");

    let spotify = login(&h.gateway, Platform::Spotify).await;
    let youtube = login(&h.gateway, Platform::YouTubeMusic).await;

    assert_eq!(youtube.user.id, spotify.user.id);
    assert_eq!(youtube.user.platform, Platform::Spotify);
    assert_eq!(h.users.count(), 1);
    assert_eq!(h.sessions.credential_count(), 2);
}

#[tokio::test]
async fn test_state_mismatch_touches_nothing() {
    let h = harness("a@x.com");

    let params = CallbackParams {
        state_cookie: Some("xyz".to_string()),
        state: Some("abc".to_string()),
        code: Some("auth-code".to_string()),
        error: None,
    };
    let result = h.gateway.complete_login(Platform::Spotify, params).await;

    assert_eq!(result, Err(AuthError::InvalidState));
    assert_eq!(h.spotify.exchange_count(), 0);
    assert_eq!(h.users.count(), 0);
    assert!(h.sessions.all_tokens().is_empty());
    assert_eq!(h.sessions.credential_count(), 0);
}

#[tokio::test]
async fn test_missing_cookie_fails_closed() {
    let h = harness("a@x.com");

    let mut params = matching_callback(&h.gateway, Platform::Spotify);
    params.state_cookie = None;

    let result = h.gateway.complete_login(Platform::Spotify, params).await;
    assert_eq!(result, Err(AuthError::InvalidState));
    assert_eq!(h.spotify.exchange_count(), 0);
}

#[tokio::test]
async fn test_provider_error_aborts_before_exchange() {
    let h = harness("a@x.com");

    let mut params = matching_callback(&h.gateway, Platform::Spotify);
    params.code = None;
    params.error = Some("access_denied".to_string());

    let result = h.gateway.complete_login(Platform::Spotify, params).await;
    assert!(matches!(result, Err(AuthError::CodeExchangeFailed(_))));
    assert_eq!(h.spotify.exchange_count(), 0);
}

#[tokio::test]
async fn test_missing_code_aborts_before_exchange() {
    let h = harness("a@x.com");

    let mut params = matching_callback(&h.gateway, Platform::Spotify);
    params.code = Some(String::new());

    let result = h.gateway.complete_login(Platform::Spotify, params).await;
    assert!(matches!(result, Err(AuthError::CodeExchangeFailed(_))));
    assert_eq!(h.spotify.exchange_count(), 0);
}

#[tokio::test]
async fn test_failed_exchange_or_profile_leaves_no_session() {
    for failure in [MockFailure::Exchange, MockFailure::Profile, MockFailure::MissingEmail] {
        let h = harness("a@x.com");
        let prior = login(&h.gateway, Platform::Spotify).await;
        let tokens_before = h.sessions.all_tokens();

        h.spotify.set_failure(failure);
        let result = h
            .gateway
            .complete_login(Platform::Spotify, matching_callback(&h.gateway, Platform::Spotify))
            .await;

        assert!(result.is_err(), "{failure:?} should abort the login");
        assert_eq!(h.sessions.all_tokens().len(), tokens_before.len());
        assert!(
            h.gateway.authenticate(Some(&prior.access_token)).await.is_ok(),
            "{failure:?} must not revoke existing sessions"
        );
    }
}

#[tokio::test]
async fn test_profile_without_email_creates_no_user() {
    let h = harness_with(
        MockProviderAdapter::new(Platform::Spotify, "a@x.com").failing(MockFailure::MissingEmail),
        MockProviderAdapter::new(Platform::YouTubeMusic, "a@x.com"),
    );

    let result = h
        .gateway
        .complete_login(Platform::Spotify, matching_callback(&h.gateway, Platform::Spotify))
        .await;

    assert!(matches!(result, Err(AuthError::MalformedProfile(_))));
    assert_eq!(h.users.count(), 0);
}

#[tokio::test]
async fn test_persistence_failure_keeps_prior_session() {
    let h = harness("a@x.com");
    let prior = login(&h.gateway, Platform::Spotify).await;

    h.sessions.set_fail_writes(true);
    let result = h
        .gateway
        .complete_login(Platform::Spotify, matching_callback(&h.gateway, Platform::Spotify))
        .await;

    assert!(matches!(result, Err(AuthError::PersistenceFailure(_))));
    h.sessions.set_fail_writes(false);
    assert!(h.gateway.authenticate(Some(&prior.access_token)).await.is_ok());
    assert_eq!(h.sessions.all_tokens().len(), 1);
}

#[tokio::test]
async fn test_relogin_without_refresh_token_keeps_stored_one() {
    let h = harness_with(
        MockProviderAdapter::new(Platform::Spotify, "a@x.com"),
        MockProviderAdapter::new(Platform::YouTubeMusic, "a@x.com").without_refresh_token(),
    );
    let user = User::new("Ann".to_string(), "a@x.com".to_string(), Platform::YouTubeMusic);
    h.users.insert(user.clone());
    let seeded = ProviderCredential {
        user_id: user.id,
        platform: Platform::YouTubeMusic,
        subject_id: "youtube_music-subject".to_string(),
        access_token: "old-access".to_string(),
        refresh_token: Some("stored-refresh".to_string()),
        updated_at: chrono::Utc::now(),
    };
    h.sessions.upsert_credential(&seeded).await.unwrap();

    login(&h.gateway, Platform::YouTubeMusic).await;

    let stored = credential(&h, &user, Platform::YouTubeMusic).await.unwrap();
    assert_eq!(stored.access_token, "youtube_music-access-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("stored-refresh"));
    assert_eq!(h.youtube.exchange_count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Identity under concurrency
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_concurrent_first_resolves_yield_one_user() {
    let users = MockUserRepository::new();
    let resolver = IdentityResolver::new(users.clone());

    let results = join_all(
        (0..16).map(|_| resolver.resolve("race@x.com", "Racer", Platform::Spotify)),
    )
    .await;

    let ids: Vec<_> = results.into_iter().map(|r| r.unwrap().0.id).collect();
    assert_eq!(users.count(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[tokio::test]
async fn test_concurrent_first_logins_share_one_user() {
    let h = harness("race@x.com");

    let attempts = (0..8).map(|_| {
        let gateway = h.gateway.clone();
        let params = matching_callback(&gateway, Platform::Spotify);
        async move { gateway.complete_login(Platform::Spotify, params).await }
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(h.users.count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_new).count(), 1);
    assert!(outcomes.iter().all(|o| o.user.id == outcomes[0].user.id));
}

// ═══════════════════════════════════════════════════════════════════════
// Session lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_logout_revokes_only_presented_token() {
    let h = harness("a@x.com");
    let outcome = login(&h.gateway, Platform::Spotify).await;
    let other = h.gateway.refresh_session(outcome.user.id).await.unwrap();

    let user = h.gateway.logout(Some(&outcome.access_token)).await.unwrap();
    assert_eq!(user.id, outcome.user.id);

    assert_eq!(
        h.gateway.authenticate(Some(&outcome.access_token)).await,
        Err(AuthError::Unauthenticated)
    );
    assert!(h.gateway.authenticate(Some(&other)).await.is_ok());
    assert_eq!(
        h.gateway.logout(Some(&outcome.access_token)).await,
        Err(AuthError::Unauthenticated)
    );
}

#[tokio::test]
async fn test_logout_without_token_is_unauthenticated() {
    let h = harness("a@x.com");
    assert_eq!(h.gateway.logout(None).await, Err(AuthError::Unauthenticated));
}

#[tokio::test]
async fn test_refresh_session_keeps_previous_token() {
    let h = harness("a@x.com");
    let outcome = login(&h.gateway, Platform::Spotify).await;

    let refreshed = h.gateway.refresh_session(outcome.user.id).await.unwrap();

    assert_ne!(refreshed, outcome.access_token);
    assert!(h.gateway.authenticate(Some(&refreshed)).await.is_ok());
    assert!(h.gateway.authenticate(Some(&outcome.access_token)).await.is_ok());
}

#[tokio::test]
async fn test_refresh_session_for_unknown_user() {
    let h = harness("a@x.com");
    let result = h
        .gateway
        .refresh_session(playsync_auth::UserId::new())
        .await;
    assert_eq!(result, Err(AuthError::UserNotFound));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let h = harness("a@x.com");
    let outcome = login(&h.gateway, Platform::Spotify).await;

    let mut chars: Vec<char> = outcome.access_token.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    assert_eq!(
        h.gateway.authenticate(Some(&tampered)).await,
        Err(AuthError::Unauthenticated)
    );
    assert_eq!(
        h.gateway.authenticate(Some("not-a-token")).await,
        Err(AuthError::Unauthenticated)
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Provider credential renewal
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_renew_provider_credential_replaces_access_token() {
    let h = harness("a@x.com");
    let outcome = login(&h.gateway, Platform::Spotify).await;

    h.gateway
        .renew_provider_credential(outcome.user.id, Platform::Spotify)
        .await
        .unwrap();

    let stored = credential(&h, &outcome.user, Platform::Spotify).await.unwrap();
    assert_eq!(stored.access_token, "spotify-refreshed-from-spotify-refresh-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("spotify-refresh-1"));
}

#[tokio::test]
async fn test_renew_provider_credential_failures() {
    let h = harness("a@x.com");
    let outcome = login(&h.gateway, Platform::Spotify).await;

    let missing = h
        .gateway
        .renew_provider_credential(outcome.user.id, Platform::YouTubeMusic)
        .await;
    assert!(matches!(missing, Err(AuthError::ProviderTokenRefreshFailed(_))));

    h.spotify.set_failure(MockFailure::Refresh);
    let refused = h
        .gateway
        .renew_provider_credential(outcome.user.id, Platform::Spotify)
        .await;
    assert!(matches!(refused, Err(AuthError::ProviderTokenRefreshFailed(_))));

    let stored = credential(&h, &outcome.user, Platform::Spotify).await.unwrap();
    assert_eq!(stored.access_token, "spotify-access-1");
}
