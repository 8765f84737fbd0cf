//! Request handlers for the REST API.
//!
//! Handlers return `Result<Json<T>, AppError>`; errors render as
//! `{"success": false, "message": "..."}` with the matching status code.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use typesprint_core::models::MessageResponse;

use crate::error::AppError;

pub mod results;
pub mod texts;
pub mod users;

pub use results::{create_result, list_results};
pub use texts::{get_text, list_texts, random_text};
pub use users::{login, logout, profile, register};

/// JSON body extractor whose rejection renders like every other error.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::MalformedPayload(rejection.body_text())),
        }
    }
}

/// `GET /` health route.
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Server is running"))
}
