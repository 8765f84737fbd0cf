//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `TokenStore`: Persistence of the session token (file, OS keychain, memory)
//! - `AuthSession`: Startup verification, login and logout, with state
//!   published on a watch channel
//! - `AccessGate`: Placeholder / render / redirect decision for protected views

pub mod gate;
pub mod session;
pub mod token_store;

pub use gate::{AccessGate, GateDecision, LOGIN_ROUTE};
pub use session::{AuthBackend, AuthSession, AuthState};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
