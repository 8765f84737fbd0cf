use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, User};

use super::TokenStore;

/// Observable authentication state.
///
/// `Initializing` is only ever the starting state: once the startup check
/// resolves, the session moves between `Authenticated` and `Anonymous`.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Initializing,
    Authenticated(User),
    Anonymous,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Backend calls the session manager depends on.
pub trait AuthBackend: Send + Sync {
    fn fetch_profile(&self, token: &str) -> impl Future<Output = Result<User, ApiError>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;
}

impl AuthBackend for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<User, ApiError> {
        self.with_token(token).get_profile().await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        ApiClient::logout(&self.with_token(token)).await.map(|_| ())
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        ApiClient::login(&self.anonymous(), username, password).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        ApiClient::register(&self.anonymous(), username, email, password).await
    }
}

/// Owns the client's authentication lifecycle.
///
/// The session is an explicitly owned value: the token lives here, not on a
/// shared HTTP client, and state changes are published on a watch channel
/// that views subscribe to.
pub struct AuthSession<S, B> {
    store: S,
    backend: B,
    token: Option<String>,
    state_tx: watch::Sender<AuthState>,
}

impl<S: TokenStore, B: AuthBackend> AuthSession<S, B> {
    pub fn new(store: S, backend: B) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Initializing);
        Self {
            store,
            backend,
            token: None,
            state_tx,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state_tx.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state_tx.borrow().is_loading()
    }

    /// The held credential, for building authenticated clients.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn set_state(&self, state: AuthState) {
        self.state_tx.send_replace(state);
    }

    /// Resolve the startup state from the persisted token.
    pub async fn initialize(&mut self) {
        let stored = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, treating as logged out");
                None
            }
        };

        match stored {
            Some(token) => {
                debug!("Stored token found, verifying with backend");
                self.token = Some(token);
                self.fetch_profile().await;
            }
            None => {
                debug!("No stored token");
                self.token = None;
                self.set_state(AuthState::Anonymous);
            }
        }
    }

    /// Verify the held token. Every failure degrades to logged out.
    pub async fn fetch_profile(&mut self) {
        let result = match self.token.as_deref() {
            Some(token) => self.backend.fetch_profile(token).await,
            None => Err(ApiError::InvalidCredential),
        };

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Session verified");
                self.set_state(AuthState::Authenticated(user));
            }
            Err(e) => {
                info!(error = %e, "Session verification failed, logging out locally");
                self.clear_local();
            }
        }
    }

    /// Adopt a user, and a token when one is given.
    pub fn login(&mut self, user: User, token: Option<String>) {
        if let Some(token) = token {
            if let Err(e) = self.store.save(&token) {
                warn!(error = %e, "Failed to persist token; session will not survive restart");
            }
            self.token = Some(token);
        }
        info!(user_id = %user.id, "Logged in");
        self.set_state(AuthState::Authenticated(user));
    }

    /// Authenticate with username and password. Errors go to the caller.
    pub async fn login_with_password(&mut self, username: &str, password: &str) -> Result<User, ApiError> {
        let AuthResponse { user, token } = self.backend.login(username, password).await?;
        self.login(user.clone(), Some(token));
        Ok(user)
    }

    /// Create an account and sign in with the token it comes with.
    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let AuthResponse { user, token } = self.backend.register(username, email, password).await?;
        self.login(user.clone(), Some(token));
        Ok(user)
    }

    /// Notify the backend, then clear local state whatever the outcome.
    pub async fn logout(&mut self) {
        match self.token.as_deref() {
            Some(token) => {
                if let Err(e) = self.backend.logout(token).await {
                    warn!(error = %e, "Logout request failed");
                }
            }
            None => debug!("Logout without a held token, skipping backend call"),
        }
        self.clear_local();
        info!("Logged out");
    }

    fn clear_local(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove stored token");
        }
        self.token = None;
        self.set_state(AuthState::Anonymous);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::auth::MemoryTokenStore;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: format!("{id}@example.com"),
            created_at: Utc::now(),
        }
    }

    /// Backend that accepts exactly one token.
    #[derive(Clone, Default)]
    struct FakeBackend {
        valid_token: Option<String>,
        expired: bool,
        offline: bool,
        logout_calls: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        fn accepting(token: &str) -> Self {
            Self {
                valid_token: Some(token.to_string()),
                ..Default::default()
            }
        }
    }

    impl AuthBackend for FakeBackend {
        async fn fetch_profile(&self, token: &str) -> Result<User, ApiError> {
            if self.offline {
                return Err(ApiError::ServerError("unreachable".into()));
            }
            if self.expired {
                return Err(ApiError::ExpiredToken);
            }
            match self.valid_token.as_deref() {
                Some(valid) if valid == token => Ok(user("1")),
                _ => Err(ApiError::InvalidCredential),
            }
        }

        async fn logout(&self, _token: &str) -> Result<(), ApiError> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                Err(ApiError::ServerError("unreachable".into()))
            } else {
                Ok(())
            }
        }

        async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
            if username == "ada" && password == "secret" {
                Ok(AuthResponse {
                    user: user("1"),
                    token: self.valid_token.clone().unwrap_or_default(),
                })
            } else {
                Err(ApiError::InvalidCredential)
            }
        }

        async fn register(&self, username: &str, _email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
            if username == "ada" {
                return Err(ApiError::Conflict("Username already taken".into()));
            }
            Ok(AuthResponse {
                user: user("2"),
                token: self.valid_token.clone().unwrap_or_default(),
            })
        }
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_anonymous() {
        let mut session = AuthSession::new(MemoryTokenStore::new(), FakeBackend::default());
        assert!(session.is_loading());
        session.initialize().await;
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_login_persists_token_for_next_startup() {
        let store = MemoryTokenStore::new();
        let backend = FakeBackend::accepting("tok");

        let mut first = AuthSession::new(store.clone(), backend.clone());
        first.initialize().await;
        first.login(user("1"), Some("tok".to_string()));
        assert!(first.state().is_authenticated());

        // Fresh session over the same storage
        let mut second = AuthSession::new(store.clone(), backend);
        second.initialize().await;
        assert_eq!(second.user().map(|u| u.id), Some("1".to_string()));
        assert_eq!(second.token(), Some("tok"));
    }

    #[tokio::test]
    async fn test_expired_token_resolves_to_anonymous_and_clears_store() {
        let store = MemoryTokenStore::with_token("old");
        let backend = FakeBackend {
            expired: true,
            ..FakeBackend::accepting("old")
        };
        let mut session = AuthSession::new(store.clone(), backend);
        session.initialize().await;

        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_local_state_when_backend_unreachable() {
        let store = MemoryTokenStore::with_token("tok");
        let backend = FakeBackend::accepting("tok");
        let mut session = AuthSession::new(store.clone(), backend.clone());
        session.initialize().await;
        assert!(session.state().is_authenticated());

        // Network goes away after startup
        session.backend = FakeBackend {
            offline: true,
            ..backend
        };
        session.logout().await;

        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(session.user(), None);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.backend().logout_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_without_token_keeps_existing_credential() {
        let store = MemoryTokenStore::with_token("tok");
        let mut session = AuthSession::new(store.clone(), FakeBackend::accepting("tok"));
        session.initialize().await;
        session.login(user("2"), None);
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.user().map(|u| u.id), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_login_with_password_surfaces_errors() {
        let store = MemoryTokenStore::new();
        let mut session = AuthSession::new(store.clone(), FakeBackend::accepting("fresh"));
        session.initialize().await;

        let err = session.login_with_password("ada", "wrong").await.unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(session.state(), AuthState::Anonymous);

        session.login_with_password("ada", "secret").await.unwrap();
        assert!(session.state().is_authenticated());
        assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_register_signs_in_and_persists_token() {
        let store = MemoryTokenStore::new();
        let mut session = AuthSession::new(store.clone(), FakeBackend::accepting("new"));
        session.initialize().await;

        let err = session.register("ada", "ada@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), None);

        let user = session.register("grace", "grace@example.com", "secret").await.unwrap();
        assert_eq!(session.user(), Some(user));
        assert_eq!(store.load().unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let mut session = AuthSession::new(MemoryTokenStore::new(), FakeBackend::accepting("tok"));
        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow(), AuthState::Initializing);

        session.initialize().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AuthState::Anonymous);

        session.login(user("1"), Some("tok".into()));
        assert!(rx.borrow_and_update().is_authenticated());

        session.logout().await;
        assert_eq!(*rx.borrow_and_update(), AuthState::Anonymous);
    }
}
