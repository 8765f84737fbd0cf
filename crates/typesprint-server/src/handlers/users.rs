use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use typesprint_core::models::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, User};

use super::AppJson;
use crate::auth::{hash_password_blocking, issue_session, verify_password_blocking, AuthUser};
use crate::error::AppError;
use crate::store::StoredUser;
use crate::AppState;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;

fn validate_register(req: &RegisterRequest) -> Result<(), AppError> {
    let username = req.username.trim();
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }

    let email = req.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid_email {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    if req.password.len() < MIN_PASSWORD_LENGTH || req.password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be between {} and {} characters",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_register(&req)?;

    let password_hash = hash_password_blocking(req.password).await?;
    let stored = StoredUser {
        id: Uuid::new_v4().to_string(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password_hash,
        created_at: Utc::now(),
    };
    state.store.insert_user(stored.clone())?;
    let session = issue_session(&state, &stored.id)?;

    tracing::info!(user_id = %stored.id, "Registered user");

    Ok(Json(AuthResponse {
        user: stored.to_public(),
        token: session.token,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let stored = state
        .store
        .find_user_by_login(req.username.trim())?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password_blocking(req.password, stored.password_hash.clone()).await? {
        tracing::debug!(user_id = %stored.id, "Rejected login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let session = issue_session(&state, &stored.id)?;
    tracing::info!(user_id = %stored.id, "User logged in");

    Ok(Json(AuthResponse {
        user: stored.to_public(),
        token: session.token,
    }))
}

pub async fn profile(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_session(&auth.token)?;
    tracing::info!(user_id = %auth.user.id, "User logged out");
    Ok(Json(MessageResponse::ok("Logged out successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_register() {
        assert!(validate_register(&request("ada", "ada@example.com", "secret1")).is_ok());
        assert!(validate_register(&request("ad", "ada@example.com", "secret1")).is_err());
        assert!(validate_register(&request("ada lovelace", "ada@example.com", "secret1")).is_err());
        assert!(validate_register(&request("ada", "ada.example.com", "secret1")).is_err());
        assert!(validate_register(&request("ada", "ada@localhost", "secret1")).is_err());
        assert!(validate_register(&request("ada", "ada@example.com", "short")).is_err());
    }
}
