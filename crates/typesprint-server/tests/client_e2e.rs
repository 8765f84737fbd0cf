//! Drives a live server with the client library: login persistence,
//! startup verification, logout, and result submission.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use typesprint_core::api::{ApiClient, ApiError};
use typesprint_core::auth::{AccessGate, AuthSession, AuthState, GateDecision, MemoryTokenStore, TokenStore};
use typesprint_core::models::NewResult;
use typesprint_core::typing::{InputOutcome, TimerMode, TypingSession};
use typesprint_server::{
    config::Config,
    create_router, seed,
    store::{SessionRecord, Store},
    AppState,
};

/// Serve a fresh backend on an ephemeral port; returns its base URL.
async fn spawn_server(data_dir: &TempDir) -> String {
    spawn_server_with_state(data_dir).await.0
}

async fn spawn_server_with_state(data_dir: &TempDir) -> (String, Arc<AppState>) {
    let store = Store::open(data_dir.path()).unwrap();
    store.seed_texts(seed::default_texts()).unwrap();
    let state = Arc::new(AppState::new(Config::default(), store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let router = create_router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{address}"), state)
}

async fn registered_client(base_url: &str, username: &str) -> ApiClient {
    let client = ApiClient::new(base_url).unwrap();
    client
        .register(username, &format!("{username}@example.com"), "secret123")
        .await
        .unwrap();
    client
}

#[tokio::test]
async fn test_login_survives_restart_and_logout_clears_it() {
    let data_dir = TempDir::new().unwrap();
    let base_url = spawn_server(&data_dir).await;
    let client = registered_client(&base_url, "ada").await;
    let store = MemoryTokenStore::new();

    // First run: no stored token, gate redirects to login
    let mut session = AuthSession::new(store.clone(), client.clone());
    session.initialize().await;
    assert_eq!(session.state(), AuthState::Anonymous);
    assert!(matches!(
        AccessGate::decide(&session.state()),
        GateDecision::Redirect { replace: true, .. }
    ));

    let user = session.login_with_password("ada", "secret123").await.unwrap();
    assert_eq!(user.username, "ada");
    assert!(store.load().unwrap().is_some());

    // Second run: the stored token is verified against the backend
    let mut restarted = AuthSession::new(store.clone(), client.clone());
    let mut rx = restarted.subscribe();
    assert!(rx.borrow().is_loading());
    restarted.initialize().await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().user().map(|u| u.username.as_str()), Some("ada"));
    assert_eq!(AccessGate::decide(&restarted.state()), GateDecision::Render);

    let token = restarted.token().unwrap().to_string();
    restarted.logout().await;
    assert_eq!(restarted.state(), AuthState::Anonymous);
    assert_eq!(store.load().unwrap(), None);

    // The token is revoked on the server too
    let err = client.with_token(token).get_profile().await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_register_through_session_signs_in() {
    let data_dir = TempDir::new().unwrap();
    let base_url = spawn_server(&data_dir).await;
    let client = ApiClient::new(&base_url).unwrap();
    let store = MemoryTokenStore::new();

    let mut session = AuthSession::new(store.clone(), client.clone());
    session.initialize().await;
    let user = session
        .register("margaret", "margaret@example.com", "secret123")
        .await
        .unwrap();
    assert_eq!(user.username, "margaret");
    assert!(store.load().unwrap().is_some());

    // The stored token is good for the next startup
    let mut restarted = AuthSession::new(store.clone(), client.clone());
    restarted.initialize().await;
    assert_eq!(restarted.user().map(|u| u.id), Some(user.id));

    let mut other = AuthSession::new(MemoryTokenStore::new(), client);
    other.initialize().await;
    let err = other
        .register("margaret", "someone@example.com", "secret123")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(other.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_wrong_password_surfaces_invalid_credential() {
    let data_dir = TempDir::new().unwrap();
    let base_url = spawn_server(&data_dir).await;
    let client = registered_client(&base_url, "grace").await;

    let mut session = AuthSession::new(MemoryTokenStore::new(), client);
    session.initialize().await;
    let err = session.login_with_password("grace", "wrong-password").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredential));
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_unknown_stored_token_degrades_to_anonymous() {
    let data_dir = TempDir::new().unwrap();
    let base_url = spawn_server(&data_dir).await;
    let client = ApiClient::new(&base_url).unwrap();
    let store = MemoryTokenStore::with_token("not-a-real-token");

    let mut session = AuthSession::new(store.clone(), client);
    session.initialize().await;
    assert_eq!(session.state(), AuthState::Anonymous);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_expired_stored_token_degrades_to_anonymous() {
    let data_dir = TempDir::new().unwrap();
    let (base_url, state) = spawn_server_with_state(&data_dir).await;
    let client = registered_client(&base_url, "ken").await;
    let store = MemoryTokenStore::new();

    let mut session = AuthSession::new(store.clone(), client.clone());
    session.login_with_password("ken", "secret123").await.unwrap();
    let token = session.token().unwrap().to_string();

    // Age the session past its expiry on the server
    let record = state.store.get_session(&token).unwrap().unwrap();
    state.store.delete_session(&token).unwrap();
    state
        .store
        .put_session(SessionRecord {
            expires_at: Utc::now() - Duration::seconds(1),
            ..record
        })
        .unwrap();

    let err = client.with_token(token).get_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::ExpiredToken));

    let mut restarted = AuthSession::new(store.clone(), client);
    restarted.initialize().await;
    assert_eq!(restarted.state(), AuthState::Anonymous);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_typing_result_submission_and_history() {
    let data_dir = TempDir::new().unwrap();
    let base_url = spawn_server(&data_dir).await;
    let client = registered_client(&base_url, "linus").await;

    let mut session = AuthSession::new(MemoryTokenStore::new(), client.clone());
    session.login_with_password("linus", "secret123").await.unwrap();
    let authed = client.with_token(session.token().unwrap());

    let text = authed.fetch_random_text().await.unwrap();
    assert_eq!(authed.fetch_text(&text.id).await.unwrap().content, text.content);
    assert!(matches!(
        authed.fetch_text("missing").await.unwrap_err(),
        ApiError::NotFound(_)
    ));
    let mut typing = TypingSession::new(&text.content, Some(text.id.clone()), TimerMode::CountUp);
    let mut chars = text.content.chars();
    let first = chars.next().unwrap();
    assert_eq!(typing.type_char(first), InputOutcome::Accepted);
    // A minute of typing keeps the WPM within the server's bounds
    for _ in 0..60 {
        typing.tick();
    }
    let mut outcome = InputOutcome::Ignored;
    for c in chars {
        outcome = typing.type_char(c);
    }
    let results = match outcome {
        InputOutcome::Completed(results) => results,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(results.accuracy, 100.0);

    let record = authed
        .submit_result(&results.to_submission(text.id.clone()))
        .await
        .unwrap();
    assert_eq!(record.text_ref, text.id);
    assert_eq!(record.user_id, session.user().unwrap().id);

    let history = authed.fetch_history().await.unwrap();
    assert_eq!(history.len(), 1);

    let err = authed
        .submit_result(&NewResult {
            text_ref: text.id,
            wpm: 50.0,
            accuracy: 250.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // Anonymous clients cannot submit
    let err = client.fetch_history().await.unwrap_err();
    assert!(err.is_auth_failure());
}
