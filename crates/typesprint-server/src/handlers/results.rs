use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use typesprint_core::models::{NewResult, ResultRecord};

use super::AppJson;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// Upper bound on a plausible WPM submission.
const MAX_WPM: f64 = 400.0;

fn validate_result(req: &NewResult) -> Result<(), AppError> {
    if req.text_ref.trim().is_empty() {
        return Err(AppError::Validation("textRef is required".to_string()));
    }
    if !req.wpm.is_finite() || req.wpm < 0.0 || req.wpm > MAX_WPM {
        return Err(AppError::Validation(format!(
            "wpm must be between 0 and {}",
            MAX_WPM
        )));
    }
    if !req.accuracy.is_finite() || !(0.0..=100.0).contains(&req.accuracy) {
        return Err(AppError::Validation(
            "accuracy must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_result(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    AppJson(req): AppJson<NewResult>,
) -> Result<Json<ResultRecord>, AppError> {
    validate_result(&req)?;

    if state.store.get_text(&req.text_ref)?.is_none() {
        return Err(AppError::NotFound("Text".to_string()));
    }

    let record = ResultRecord {
        id: Uuid::new_v4().to_string(),
        user_id: auth.user.id.clone(),
        text_ref: req.text_ref,
        wpm: req.wpm,
        accuracy: req.accuracy,
        created_at: Utc::now(),
    };
    state.store.insert_result(record.clone())?;

    tracing::info!(
        user_id = %auth.user.id,
        wpm = record.wpm,
        accuracy = record.accuracy,
        "Stored typing result"
    );

    Ok(Json(record))
}

pub async fn list_results(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<ResultRecord>>, AppError> {
    Ok(Json(state.store.results_for_user(&auth.user.id)?))
}
