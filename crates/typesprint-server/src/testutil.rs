//! Shared test helpers for the crate's `#[cfg(test)]` modules.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use typesprint_core::models::User;

use crate::auth::hash_password;
use crate::config::Config;
use crate::store::{Store, StoredUser};
use crate::AppState;

/// An `AppState` over an in-memory store with the default config.
pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Config::default(), Store::in_memory()))
}

/// Insert a user with a real password hash and return its public form.
pub fn insert_user(state: &AppState, username: &str, password: &str) -> User {
    let stored = StoredUser {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: hash_password(password).unwrap(),
        created_at: Utc::now(),
    };
    state.store.insert_user(stored.clone()).unwrap();
    stored.to_public()
}
