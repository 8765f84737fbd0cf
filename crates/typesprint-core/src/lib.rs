//! Core library for typesprint.
//!
//! This crate provides the shared functionality used by the terminal client
//! and the REST backend:
//!
//! - `api`: REST client and error taxonomy for the typesprint backend
//! - `auth`: Token storage, the auth session manager, and the access gate
//! - `config`: Client configuration (backend URL, token store, timer)
//! - `models`: Wire types shared by client and server
//! - `typing`: The typing-test state machine and result computation

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod typing;

pub use api::{ApiClient, ApiError};
pub use auth::{AccessGate, AuthSession, AuthState, GateDecision, TokenStore};
pub use config::Config;
pub use typing::{CharState, Phase, Results, TimerMode, TypingSession};
