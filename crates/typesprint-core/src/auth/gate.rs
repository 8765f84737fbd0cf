use super::AuthState;

/// Route the gate sends anonymous users to.
pub const LOGIN_ROUTE: &str = "/login";

/// What a protected view should do for the current auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Startup check still running; show a neutral placeholder.
    Placeholder,
    /// Show the protected content.
    Render,
    /// Navigate to `to`. With `replace`, the protected location must not be
    /// left in navigation history.
    Redirect { to: &'static str, replace: bool },
}

/// Guard in front of protected views.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    pub fn decide(state: &AuthState) -> GateDecision {
        match state {
            AuthState::Initializing => GateDecision::Placeholder,
            AuthState::Authenticated(_) => GateDecision::Render,
            AuthState::Anonymous => GateDecision::Redirect {
                to: LOGIN_ROUTE,
                replace: true,
            },
        }
    }
}
