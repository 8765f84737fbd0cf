//! Credentials: password hashing, token generation, and the bearer-token
//! extractor used by authenticated handlers.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use rand::Rng;

use typesprint_core::models::User;

use crate::error::AppError;
use crate::store::SessionRecord;
use crate::AppState;

/// Hash a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Failed to encode salt: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Run argon2 work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {e}")))
}

/// `hash_password` off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    run_blocking(move || hash_password(&password)).await?
}

/// `verify_password` off the async workers.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    run_blocking(move || verify_password(&password, &hash)).await
}

/// Generate a secure random token (32 bytes, hex encoded = 64 characters)
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Create and store a session for `user_id`.
pub fn issue_session(state: &AppState, user_id: &str) -> Result<SessionRecord, AppError> {
    let now = Utc::now();
    let ttl = state.config.session_ttl_seconds;
    let expires_at = i64::try_from(ttl)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(format!("Session TTL out of range: {ttl}s")))?;
    let session = SessionRecord {
        token: generate_token(),
        user_id: user_id.to_string(),
        created_at: now,
        expires_at,
    };
    state.store.put_session(session.clone())?;
    tracing::debug!(user_id = %user_id, "Issued session token");
    Ok(session)
}

/// Resolve a bearer token to its user. Expired sessions are deleted.
pub fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    let session = state
        .store
        .get_session(token)?
        .ok_or(AppError::InvalidToken)?;

    if session.is_expired(Utc::now()) {
        state.store.delete_session(token)?;
        tracing::debug!(user_id = %session.user_id, "Session token expired");
        return Err(AppError::TokenExpired);
    }

    let user = state
        .store
        .get_user(&session.user_id)?
        .ok_or(AppError::InvalidToken)?;
    Ok(user.to_public())
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::MissingToken)?.to_string();
        let user = authenticate(state, &token)?;
        Ok(AuthUser { user, token })
    }
}
