//! The session context handed to views.
//!
//! `AuthService` owns the API client and the session and is passed
//! explicitly to whoever needs it; there is no global session. It applies
//! the client's one recovery rule: an authenticated call answered with 401
//! (or made with an expired token) logs the user out and redirects to login.

use reqwest::{Method, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{Session, SessionError, SessionStatus};
use crate::forms::{
    Credentials, LoginForm, PasswordReset, RegisterForm, Registration, ResetPasswordForm,
    ValidationError,
};
use crate::models::{Ticket, User};
use crate::route::Route;

pub const RESET_SUCCESS_MESSAGE: &str = "Password reset successful. Redirecting...";
pub const RESET_INVALID_LINK_MESSAGE: &str = "Invalid or expired reset link.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session expired - logged out")]
    SessionExpired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ServiceError {
    /// Where the UI should navigate after this error, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            ServiceError::SessionExpired => Some(Route::Login),
            _ => None,
        }
    }

    /// Whether the request never left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    /// Message suitable for inline display under a form.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Validation(e) => e.to_string(),
            ServiceError::InvalidCredentials => self.to_string(),
            ServiceError::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            ServiceError::Api(e) | ServiceError::Session(SessionError::Rejected(e)) => {
                api_message(e)
            }
            ServiceError::Session(SessionError::InvalidToken(_)) => {
                "The server issued a token this client cannot read.".to_string()
            }
            ServiceError::Session(SessionError::Storage(_)) => {
                "Could not save your session on this device.".to_string()
            }
        }
    }
}

fn api_message(e: &ApiError) -> String {
    if e.is_timeout() {
        "Connection timed out. Please try again.".to_string()
    } else if e.is_transport() {
        "Unable to connect to server. Check your internet connection.".to_string()
    } else {
        match e {
            ApiError::Unauthorized => SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::BadRequest { body, .. } if !body.trim().is_empty() => {
                format!("Request rejected: {}", body)
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// The server issued a token with the new account; the user is signed in.
    SignedIn(User),
    /// Account created; the user still has to log in.
    Registered,
}

pub struct AuthService {
    api: ApiClient,
    session: Session,
}

impl AuthService {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &SessionStatus {
        self.session.status()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn sync_token(&mut self) {
        match self.session.token() {
            Some(token) => self.api.set_token(token.to_string()),
            None => self.api.clear_token(),
        }
    }

    /// Resolve the persisted session. Called once at startup.
    pub async fn initialize(&mut self) -> &SessionStatus {
        self.session.restore(&self.api).await;
        self.sync_token();
        self.session.status()
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<User, ServiceError> {
        let response = match self
            .api
            .login(&credentials.username, &credentials.password)
            .await
        {
            Ok(response) => response,
            Err(ApiError::Unauthorized) | Err(ApiError::BadRequest { status: 400, .. }) => {
                warn!(username = %credentials.username, "Login rejected");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        let result = self.session.establish(response.token, &self.api).await;
        self.sync_token();
        let user = result?;
        info!(user_id = user.id, "Login successful");
        Ok(user)
    }

    pub async fn submit_login(&mut self, form: &LoginForm) -> Result<User, ServiceError> {
        let credentials = form.validate()?;
        self.login(&credentials).await
    }

    pub async fn register(
        &mut self,
        registration: &Registration,
    ) -> Result<RegistrationOutcome, ServiceError> {
        let payload = self
            .api
            .register(
                &registration.username,
                &registration.email,
                &registration.password,
            )
            .await?;

        let token = payload
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty());

        match token {
            Some(token) => {
                let result = self.session.establish(token.to_string(), &self.api).await;
                self.sync_token();
                let user = result?;
                info!(user_id = user.id, "Registered and signed in");
                Ok(RegistrationOutcome::SignedIn(user))
            }
            None => {
                info!(username = %registration.username, "Registered");
                Ok(RegistrationOutcome::Registered)
            }
        }
    }

    pub async fn submit_registration(
        &mut self,
        form: &RegisterForm,
    ) -> Result<RegistrationOutcome, ServiceError> {
        let registration = form.validate()?;
        self.register(&registration).await
    }

    /// Local logout: forget the token; the server is not contacted.
    pub fn logout(&mut self) -> Result<(), ServiceError> {
        let result = self.session.clear();
        self.api.clear_token();
        info!("Logged out");
        result.map_err(ServiceError::from)
    }

    pub async fn reset_password(&self, reset: &PasswordReset) -> Result<(), ServiceError> {
        self.api
            .reset_password(&reset.token, &reset.password)
            .await
            .map_err(ServiceError::from)
    }

    /// Validate the reset form, then submit it. A form that fails validation
    /// issues no request.
    pub async fn submit_reset(&self, form: &ResetPasswordForm) -> Result<(), ServiceError> {
        let reset = form.validate()?;
        self.reset_password(&reset).await
    }

    /// Message to show under the reset form for a given outcome.
    pub fn reset_message(result: &Result<(), ServiceError>) -> String {
        match result {
            Ok(()) => RESET_SUCCESS_MESSAGE.to_string(),
            Err(ServiceError::Validation(e)) => e.to_string(),
            Err(ServiceError::Api(e)) if !e.is_transport() => {
                RESET_INVALID_LINK_MESSAGE.to_string()
            }
            Err(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    // ===== Authenticated Requests =====

    fn force_logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session during forced logout");
        }
        self.api.clear_token();
    }

    fn precheck(&mut self) -> Result<(), ServiceError> {
        if !self.session.ensure_fresh() {
            self.force_logout();
            return Err(ServiceError::SessionExpired);
        }
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ServiceError> {
        match result {
            Err(ApiError::Unauthorized) => {
                warn!("Authenticated request unauthorized, logging out");
                self.force_logout();
                Err(ServiceError::SessionExpired)
            }
            other => other.map_err(ServiceError::from),
        }
    }

    /// Any authenticated call. A 401, a missing session or an expired
    /// token ends the session and yields `SessionExpired`.
    pub async fn send_authorized(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ServiceError> {
        self.precheck()?;
        let result = self.api.send_authorized(method, path, body).await;
        self.settle(result)
    }

    pub async fn list_tickets(&mut self) -> Result<Vec<Ticket>, ServiceError> {
        self.precheck()?;
        let result = self.api.list_tickets().await;
        self.settle(result)
    }
}
