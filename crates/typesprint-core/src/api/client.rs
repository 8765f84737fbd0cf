//! API client for communicating with the typesprint REST backend.
//!
//! This module provides the `ApiClient` struct for login/logout, profile
//! retrieval, fetching source texts, and submitting typing results.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{
    AuthResponse, LoginRequest, MessageResponse, NewResult, RegisterRequest, ResultRecord, Text,
    User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:10000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// API client for the typesprint backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
///
/// The bearer token travels with the client value rather than with a shared
/// default configuration: `with_token` produces a new client carrying the
/// credential, and every request built from it stamps the header.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    /// Same client without a credential.
    pub fn anonymous(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = Self::check_response(response).await?;
        debug!(path = path, status = %response.status(), "Request succeeded");
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), path).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body), path).await
    }

    // ===== Users =====

    /// Exchange username/password for a user and a session token
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post("/api/users/login", &body).await
    }

    /// Create an account; the response carries a session token like `login`
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/api/users/register", &body).await
    }

    /// Fetch the profile for the held token
    pub async fn get_profile(&self) -> Result<User, ApiError> {
        self.get("/api/users/profile").await
    }

    /// Tell the backend to revoke the held token
    pub async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.send(self.request(Method::POST, "/api/users/logout"), "/api/users/logout")
            .await
    }

    // ===== Texts =====

    pub async fn fetch_texts(&self) -> Result<Vec<Text>, ApiError> {
        self.get("/api/texts").await
    }

    pub async fn fetch_random_text(&self) -> Result<Text, ApiError> {
        self.get("/api/texts/random").await
    }

    pub async fn fetch_text(&self, id: &str) -> Result<Text, ApiError> {
        self.get(&format!("/api/texts/{}", id)).await
    }

    // ===== Results =====

    /// Persist a completed test. Validation failures are returned so the
    /// caller can show them and retry.
    pub async fn submit_result(&self, result: &NewResult) -> Result<ResultRecord, ApiError> {
        self.post("/api/results", result).await
    }

    /// The caller's history, newest first
    pub async fn fetch_history(&self) -> Result<Vec<ResultRecord>, ApiError> {
        self.get("/api/results").await
    }
}
