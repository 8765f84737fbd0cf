//! typesprint-server - REST backend for the typesprint typing test
//!
//! This crate provides:
//! - User registration, login, profile and logout with opaque bearer tokens
//! - Source texts handed out for typing tests
//! - Result submission and per-user history
//! - A JSON document store persisted under the data directory

pub mod auth;
pub mod config;
pub mod error;
pub mod expiration;
pub mod handlers;
pub mod routes;
pub mod seed;
pub mod store;
#[cfg(test)]
pub mod testutil;

use config::Config;
use store::Store;

pub use routes::create_router;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Store,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        Self { config, store }
    }
}
