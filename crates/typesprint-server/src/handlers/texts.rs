use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use typesprint_core::models::Text;

use crate::error::AppError;
use crate::AppState;

pub async fn list_texts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Text>>, AppError> {
    Ok(Json(state.store.list_texts()?))
}

pub async fn random_text(State(state): State<Arc<AppState>>) -> Result<Json<Text>, AppError> {
    state
        .store
        .random_text()?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Text".to_string()))
}

pub async fn get_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Text>, AppError> {
    state
        .store
        .get_text(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Text".to_string()))
}
