//! API client for the ticket system REST API.
//!
//! Thin wrapper over `reqwest` issuing the register / login / user /
//! reset-password requests and attaching the bearer token to authenticated
//! calls. There is no retry policy: a failed request surfaces its error to
//! the caller.

use std::time::Duration;

use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, Ticket, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default API base URL when neither config nor environment provides one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
/// Bounds how long a session can sit in the loading state on a hung request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const REGISTER_PATH: &str = "/register/";
const LOGIN_PATH: &str = "/login/";
const USER_PATH: &str = "/user/";
const RESET_PASSWORD_PATH: &str = "/reset-password";
const TICKETS_PATH: &str = "/tickets/";

/// API client for the ticket system.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    // ===== Authentication Endpoints =====

    /// Register a new account. Returns the server payload untouched; some
    /// deployments answer with the created user, others with a token as well.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Value, ApiError> {
        let url = self.url(REGISTER_PATH);
        debug!(%url, username, "Sending registration request");

        let response = self
            .client
            .post(&url)
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, "registration response").await
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(%url, username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let login: LoginResponse = Self::parse_json(response, "login response").await?;

        if login.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response contained an empty token".to_string(),
            ));
        }
        Ok(login)
    }

    /// Fetch the identity behind a token.
    pub async fn fetch_user(&self, token: &str) -> Result<User, ApiError> {
        let url = self.url(USER_PATH);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, "user response").await
    }

    /// Set a new password using the token from a reset link.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        let url = self.url(RESET_PASSWORD_PATH);
        debug!(%url, "Sending password reset request");

        let response = self
            .client
            .post(&url)
            .json(&ResetPasswordRequest { token, password })
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Authenticated Requests =====

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthorized)?;
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::Unauthorized)?;
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Send an authenticated request. A client without a token fails with
    /// `Unauthorized` before touching the network, the same as a 401.
    pub async fn send_authorized(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "Authenticated request rejected");
        }
        Self::check_response(response).await
    }

    pub async fn get_authorized<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send_authorized(Method::GET, path, None).await?;
        Self::parse_json(response, path).await
    }

    /// Fetch the tickets visible to the current user
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get_authorized(TICKETS_PATH).await
    }
}
