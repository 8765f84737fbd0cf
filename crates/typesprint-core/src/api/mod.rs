//! REST API client module for the typesprint backend.
//!
//! This module provides the `ApiClient` for logging in and out, fetching
//! source texts, and submitting typing results.
//!
//! Authenticated endpoints expect an `Authorization: Bearer <token>` header;
//! the token is carried per client value (see `ApiClient::with_token`).

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
