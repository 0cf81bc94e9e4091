use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::storage::TokenStore;
use super::token::{self, TokenError};

/// Where the user identity comes from once a token is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// Read the identity from the JWT payload, no network request.
    Decode,
    /// Ask `GET /user/` who the token belongs to.
    #[default]
    Fetch,
}

/// Resolution state of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Startup: the persisted token has not been checked yet.
    Unresolved,
    Authenticated(User),
    Anonymous,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("session token rejected: {0}")]
    Rejected(#[from] ApiError),

    #[error("token storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl SessionError {
    /// Whether the failure means the token itself is no good, as opposed to
    /// a transport or storage problem.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            SessionError::InvalidToken(_) => true,
            SessionError::Rejected(e) => e.is_unauthorized(),
            SessionError::Storage(_) => false,
        }
    }
}

/// The client-held session: bearer token plus the identity derived from it.
///
/// Invariants:
/// - no token means no identity
/// - a token that fails to decode, is expired, or is rejected by the server
///   is dropped together with the identity and the persisted copy
pub struct Session {
    store: Box<dyn TokenStore>,
    identity_source: IdentitySource,
    token: Option<String>,
    status: SessionStatus,
}

impl Session {
    pub fn new(store: Box<dyn TokenStore>, identity_source: IdentitySource) -> Self {
        Self {
            store,
            identity_source,
            token: None,
            status: SessionStatus::Unresolved,
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn identity_source(&self) -> IdentitySource {
        self.identity_source
    }

    /// True until the initial resolution completes.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, SessionStatus::Unresolved)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.status {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Get the bearer token if the session is authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Resolve the persisted token at startup.
    ///
    /// Any failure (unreadable store, bad token, rejected or failed fetch)
    /// leaves the session anonymous with the persisted token removed. There
    /// is no retry.
    pub async fn restore(&mut self, api: &ApiClient) -> &SessionStatus {
        let persisted = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        };

        let Some(persisted) = persisted.filter(|t| !t.trim().is_empty()) else {
            debug!("No persisted token found");
            self.reset();
            self.discard_persisted();
            return &self.status;
        };

        match self.resolve_identity(&persisted, api).await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                self.token = Some(persisted);
                self.status = SessionStatus::Authenticated(user);
            }
            Err(e) => {
                warn!(error = %e, "Persisted token is invalid, clearing session");
                self.reset();
                self.discard_persisted();
            }
        }
        &self.status
    }

    /// Set the session from a freshly issued token: resolve the identity,
    /// then persist the token. On failure nothing is kept.
    pub async fn establish(&mut self, token: String, api: &ApiClient) -> Result<User, SessionError> {
        let user = match self.resolve_identity(&token, api).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Could not resolve identity for new token");
                self.reset();
                self.discard_persisted();
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&token) {
            self.reset();
            self.discard_persisted();
            return Err(SessionError::Storage(e));
        }

        info!(user_id = user.id, "Session established");
        self.token = Some(token);
        self.status = SessionStatus::Authenticated(user.clone());
        Ok(user)
    }

    /// Remove the persisted token and forget the identity.
    ///
    /// The in-memory session is always cleared, even if the store fails.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.reset();
        self.store.clear().map_err(SessionError::Storage)
    }

    /// Drop the session if its token has expired since it was resolved.
    /// Returns false when the session was cleared.
    pub fn ensure_fresh(&mut self) -> bool {
        let Some(token) = self.token.as_deref() else {
            return false;
        };
        if let Err(e) = token::check_not_expired(token, Utc::now()) {
            info!(error = %e, "Session token expired, logging out");
            self.reset();
            self.discard_persisted();
            return false;
        }
        true
    }

    async fn resolve_identity(&self, token: &str, api: &ApiClient) -> Result<User, SessionError> {
        let now = Utc::now();
        token::check_not_expired(token, now)?;

        match self.identity_source {
            IdentitySource::Decode => Ok(token::decode_user(token, now)?),
            IdentitySource::Fetch => Ok(api.fetch_user(token).await?),
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.status = SessionStatus::Anonymous;
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted token");
        }
    }
}
