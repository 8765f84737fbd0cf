//! Application state management for the typesprint terminal client.
//!
//! This module contains the `App` struct that owns the auth session, the
//! current typing attempt, the result history, and the navigation stack.
//! Protected screens consult the access gate after every event.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use typesprint_core::api::{ApiClient, ApiError};
use typesprint_core::auth::{AccessGate, AuthSession, AuthState, GateDecision, TokenStore};
use typesprint_core::models::{NewResult, ResultRecord, Text};
use typesprint_core::typing::{
    InputOutcome, Phase, Results, TimerMode, TypingSession, DEFAULT_TEST_SECS,
};
use typesprint_core::Config;

use crate::nav::{Navigator, Route};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
/// The login field also accepts an email address.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// Matches the backend's upper bound.
const MAX_PASSWORD_LENGTH: usize = 128;

/// How often the typing timer advances.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Passage used when the backend cannot supply one.
/// Results typed against it are not submitted.
pub const PRACTICE_TEXT: &str =
    "The quick brown fox jumps over the lazy dog while five boxing wizards jump quickly.";

/// The session type used by the client: configured token store, HTTP backend.
pub type Session = AuthSession<Box<dyn TokenStore>, ApiClient>;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Outcome of saving the last completed test.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
    Idle,
    Saved,
    /// Not sent at all (practice text).
    Skipped(String),
    /// Sent and rejected or unreachable.
    Failed { message: String, retryable: bool },
}

/// Best and average speed over a result history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub tests: usize,
    pub best_wpm: f64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
}

pub fn summarize(records: &[ResultRecord]) -> Option<HistorySummary> {
    if records.is_empty() {
        return None;
    }
    let count = records.len() as f64;
    let best_wpm = records.iter().map(|r| r.wpm).fold(0.0, f64::max);
    let average_wpm = records.iter().map(|r| r.wpm).sum::<f64>() / count;
    let average_accuracy = records.iter().map(|r| r.accuracy).sum::<f64>() / count;
    Some(HistorySummary {
        tests: records.len(),
        best_wpm,
        average_wpm: average_wpm.round(),
        average_accuracy: (average_accuracy * 10.0).round() / 10.0,
    })
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub api: ApiClient,

    // Auth: the session lives in `init_task` until the startup check finishes
    session: Option<Session>,
    init_task: Option<JoinHandle<Session>>,
    auth_rx: watch::Receiver<AuthState>,
    pub auth_state: AuthState,

    // Navigation
    pub state: AppState,
    pub nav: Navigator,
    return_to: Option<Route>,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Typing
    pub typing: TypingSession,
    pub current_text: Option<Text>,
    countdown_secs: u32,
    last_tick: Instant,
    pending_submission: Option<NewResult>,
    pub submit_status: SubmitStatus,

    // History
    pub history: Vec<ResultRecord>,
    pub history_selection: usize,
    text_titles: HashMap<String, String>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create the app and start verifying any stored token in the background.
    pub fn new(config: Config) -> Result<Self> {
        let backend_url = config.backend_url();
        debug!(%backend_url, "Backend configured");

        let api = ApiClient::new(backend_url).context("Failed to build HTTP client")?;
        let store = config.token_store()?;
        Ok(Self::from_parts(config, api, store))
    }

    /// Build the app over an explicit client and token store.
    fn from_parts(config: Config, api: ApiClient, store: Box<dyn TokenStore>) -> Self {
        let mut session: Session = AuthSession::new(store, api.clone());
        let auth_rx = session.subscribe();
        let auth_state = auth_rx.borrow().clone();

        let init_task = tokio::spawn(async move {
            session.initialize().await;
            session
        });

        let countdown_secs = match config.timer {
            TimerMode::CountDown(secs) => secs,
            TimerMode::CountUp => DEFAULT_TEST_SECS,
        };
        let typing = TypingSession::new(PRACTICE_TEXT, None, config.timer);
        let login_username = config.last_username.clone().unwrap_or_default();

        Self {
            config,
            api,

            session: None,
            init_task: Some(init_task),
            auth_rx,
            auth_state,

            state: AppState::Normal,
            nav: Navigator::new(Route::Typing),
            return_to: None,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,

            typing,
            current_text: None,
            countdown_secs,
            last_tick: Instant::now(),
            pending_submission: None,
            submit_status: SubmitStatus::Idle,

            history: Vec::new(),
            history_selection: 0,
            text_titles: HashMap::new(),

            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Gate decision for the current auth state.
    pub fn gate(&self) -> GateDecision {
        AccessGate::decide(&self.auth_state)
    }

    fn authed_api(&self) -> Option<ApiClient> {
        self.session
            .as_ref()?
            .token()
            .map(|token| self.api.with_token(token))
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        let Some(session) = self.session.as_mut() else {
            self.login_error = Some("Still checking saved session, try again".to_string());
            return Err(anyhow::anyhow!("Session check still running"));
        };

        self.login_error = None;

        match session.login_with_password(&username, &password).await {
            Ok(user) => {
                info!(user_id = %user.id, "Login successful");
                self.login_password.clear();
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e.into())
            }
        }
    }

    /// Show the login form.
    pub fn start_login(&mut self) {
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub async fn logout(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.logout().await;

        self.history.clear();
        self.history_selection = 0;
        self.pending_submission = None;
        self.submit_status = SubmitStatus::Idle;
        self.status_message = Some("Logged out".to_string());
    }

    /// Re-verify the held token after a request was rejected as unauthorized.
    async fn handle_auth_failure(&mut self, err: &ApiError) {
        if !err.is_auth_failure() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            debug!("Request rejected as unauthorized, re-verifying session");
            session.fetch_profile().await;
        }
    }

    // =========================================================================
    // Background tasks and gating
    // =========================================================================

    /// Collect the startup check, pick up auth changes, and apply the gate.
    pub async fn check_background_tasks(&mut self) -> Result<()> {
        if self.init_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.init_task.take() {
                let session = task.await.context("Session check task failed")?;
                debug!("Startup session check finished");
                self.session = Some(session);
            }
        }

        if self.auth_rx.has_changed().unwrap_or(false) {
            let next = self.auth_rx.borrow_and_update().clone();
            let became_authenticated = next.is_authenticated() && !self.auth_state.is_authenticated();
            self.auth_state = next;
            if became_authenticated {
                self.on_authenticated().await;
            }
        }

        self.apply_gate();
        Ok(())
    }

    fn apply_gate(&mut self) {
        let current = self.nav.current();
        if !current.is_protected() {
            return;
        }

        if let GateDecision::Redirect { to, replace } = self.gate() {
            let target = Route::from_path(to).unwrap_or(Route::Login);
            debug!(from = current.path(), to, "Redirecting away from protected screen");
            if replace {
                self.nav.replace(target);
            } else {
                self.nav.push(target);
            }
            self.return_to = Some(current);
            self.start_login();
        }
    }

    async fn on_authenticated(&mut self) {
        self.login_error = None;
        if self.nav.current() == Route::Login {
            let target = self.return_to.take().unwrap_or(Route::Typing);
            self.nav.replace(target);
        }
        if self.typing.text_id().is_none() {
            self.new_test().await;
        }
        self.load_history().await;
    }

    // =========================================================================
    // Typing
    // =========================================================================

    /// Load a random text and start over.
    pub async fn new_test(&mut self) {
        match self.api.fetch_random_text().await {
            Ok(text) => {
                debug!(text_id = %text.id, "Loaded text");
                self.typing.reset(&text.content, Some(text.id.clone()));
                self.text_titles.insert(text.id.clone(), text.title.clone());
                self.current_text = Some(text);
                self.status_message = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch a text, using practice text");
                self.typing.reset(PRACTICE_TEXT, None);
                self.current_text = None;
                self.status_message = Some("Backend unavailable: practice text loaded".to_string());
            }
        }
        self.pending_submission = None;
        self.submit_status = SubmitStatus::Idle;
    }

    /// Restart the current text.
    pub fn restart_test(&mut self) {
        let source = self.typing.source_text();
        let text_id = self.typing.text_id().map(str::to_string);
        self.typing.reset(&source, text_id);
        self.pending_submission = None;
        self.submit_status = SubmitStatus::Idle;
    }

    pub fn toggle_timer_mode(&mut self) {
        if self.typing.is_active() {
            self.status_message = Some("Finish the current test first".to_string());
            return;
        }
        let mode = match self.typing.timer_mode() {
            TimerMode::CountDown(_) => TimerMode::CountUp,
            TimerMode::CountUp => TimerMode::CountDown(self.countdown_secs),
        };
        self.typing.set_timer_mode(mode);
        self.config.timer = mode;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    pub async fn type_char(&mut self, c: char) {
        let was_ready = self.typing.phase() == Phase::Ready;
        let outcome = self.typing.type_char(c);
        if was_ready && self.typing.phase() != Phase::Ready {
            // Timer seconds count from the first keystroke
            self.last_tick = Instant::now();
        }
        self.handle_outcome(outcome).await;
    }

    pub fn backspace(&mut self) {
        self.typing.backspace();
    }

    pub async fn end_test(&mut self) {
        let outcome = self.typing.end_test();
        self.handle_outcome(outcome).await;
    }

    /// Advance the timer if a full interval has passed.
    pub async fn maybe_tick(&mut self) {
        if self.last_tick.elapsed() < TICK_INTERVAL {
            return;
        }
        // Keep the remainder so ticks do not drift
        self.last_tick += TICK_INTERVAL;
        let outcome = self.typing.tick();
        self.handle_outcome(outcome).await;
    }

    async fn handle_outcome(&mut self, outcome: InputOutcome) {
        if let InputOutcome::Completed(results) = outcome {
            info!(
                wpm = results.wpm,
                accuracy = results.accuracy,
                elapsed_secs = results.elapsed_secs,
                "Typing test completed"
            );
            self.submit_results(&results).await;
        }
    }

    /// Statistics for display: final results once completed, live otherwise.
    pub fn live_results(&self) -> Results {
        match self.typing.results() {
            Some(results) => results.clone(),
            None => Results::compute(
                self.typing.source(),
                self.typing.input(),
                self.typing.elapsed_secs(),
            ),
        }
    }

    // =========================================================================
    // Results
    // =========================================================================

    async fn submit_results(&mut self, results: &Results) {
        let payload = self
            .typing
            .text_id()
            .map(|text_id| results.to_submission(text_id));

        match payload {
            Some(payload) => {
                self.pending_submission = Some(payload);
                self.retry_submission().await;
            }
            None => {
                self.submit_status =
                    SubmitStatus::Skipped("Practice text results are not saved".to_string());
            }
        }
    }

    /// Send the pending result, if any.
    pub async fn retry_submission(&mut self) {
        let Some(payload) = self.pending_submission.clone() else {
            return;
        };
        let Some(api) = self.authed_api() else {
            self.submit_status = SubmitStatus::Failed {
                message: "Not logged in".to_string(),
                retryable: true,
            };
            return;
        };

        match api.submit_result(&payload).await {
            Ok(record) => {
                info!(result_id = %record.id, "Result saved");
                self.history.insert(0, record);
                self.pending_submission = None;
                self.submit_status = SubmitStatus::Saved;
            }
            Err(e) => {
                warn!(error = %e, "Failed to submit result");
                self.submit_status = SubmitStatus::Failed {
                    message: submit_error_message(&e),
                    retryable: submission_retryable(&e),
                };
                self.handle_auth_failure(&e).await;
            }
        }
    }

    pub fn can_retry_submission(&self) -> bool {
        self.pending_submission.is_some()
            && matches!(self.submit_status, SubmitStatus::Failed { retryable: true, .. })
    }

    // =========================================================================
    // History
    // =========================================================================

    pub async fn show_history(&mut self) {
        self.nav.push(Route::History);
        self.load_history().await;
    }

    pub async fn load_history(&mut self) {
        let Some(api) = self.authed_api() else {
            return;
        };

        let (history, texts) = futures::join!(api.fetch_history(), api.fetch_texts());

        match texts {
            Ok(texts) => {
                for text in texts {
                    self.text_titles.insert(text.id, text.title);
                }
            }
            Err(e) => warn!(error = %e, "Failed to fetch text titles"),
        }

        match history {
            Ok(records) => {
                debug!(count = records.len(), "Loaded history");
                self.history = records;
                self.history_selection = self
                    .history_selection
                    .min(self.history.len().saturating_sub(1));
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch history");
                self.status_message = Some(format!("Could not load history: {}", e));
                self.handle_auth_failure(&e).await;
            }
        }
    }

    pub fn text_title(&self, text_ref: &str) -> &str {
        self.text_titles
            .get(text_ref)
            .map(String::as_str)
            .unwrap_or("Unknown text")
    }

    pub fn history_summary(&self) -> Option<HistorySummary> {
        summarize(&self.history)
    }

    pub fn select_next_result(&mut self) {
        if self.history_selection + 1 < self.history.len() {
            self.history_selection += 1;
        }
    }

    pub fn select_previous_result(&mut self) {
        self.history_selection = self.history_selection.saturating_sub(1);
    }
}

// ============================================================================
// Error messages
// ============================================================================

/// User-facing message for a failed login.
pub fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::InvalidCredential => "Invalid username or password".to_string(),
        ApiError::NetworkError(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Is the backend running?".to_string()
        }
        ApiError::Validation(message) => message.clone(),
        ApiError::RateLimited => "Too many attempts. Please wait and retry.".to_string(),
        other => format!("Login failed: {}", other),
    }
}

/// User-facing message for a failed result submission.
pub fn submit_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Validation(message) => format!("Rejected: {}", message),
        ApiError::NotFound(_) => "The text no longer exists".to_string(),
        e if e.is_auth_failure() => "Session expired, please log in again".to_string(),
        ApiError::NetworkError(_) => "Unable to reach the server".to_string(),
        other => other.to_string(),
    }
}

/// Whether resending the same result can succeed. Auth failures count:
/// the result is kept and can be sent after logging back in.
pub fn submission_retryable(err: &ApiError) -> bool {
    err.is_retryable() || err.is_auth_failure()
}

/// User-facing message for a failed registration.
pub fn register_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Conflict(message) | ApiError::Validation(message) => message.clone(),
        ApiError::NetworkError(_) | ApiError::RateLimited => login_error_message(err),
        other => format!("Registration failed: {}", other),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use typesprint_core::auth::MemoryTokenStore;

    use super::*;

    /// An app whose backend is unreachable: nothing listens on port 1.
    pub fn offline_app(store: MemoryTokenStore) -> App {
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        App::from_parts(Config::default(), api, Box::new(store))
    }
}
