//! Client-side JWT payload decoding.
//!
//! The client never verifies signatures; it only reads the payload to derive
//! the user identity and the expiry. The server remains the authority and
//! rejects forged tokens with a 401.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Role, User};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("token is not a JWT (expected three dot-separated segments)")]
    Malformed,

    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload is not valid JSON claims: {0}")]
    Payload(String),

    #[error("token carries no user id")]
    MissingIdentity,

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Claims read from a token payload.
///
/// Field names cover the shapes issued by the servers this client talks to:
/// a numeric `user_id`/`id`, or a numeric `sub`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default, alias = "id")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Tokens without `exp` never expire on the client side.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }

    fn subject_id(&self) -> Option<i64> {
        match self.sub.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn subject_name(&self) -> Option<String> {
        match self.sub.as_ref()? {
            serde_json::Value::String(s) if s.parse::<i64>().is_err() => Some(s.clone()),
            _ => None,
        }
    }

    /// Build the user identity carried by these claims.
    pub fn to_user(&self) -> Result<User, TokenError> {
        let id = self
            .user_id
            .or_else(|| self.subject_id())
            .ok_or(TokenError::MissingIdentity)?;

        Ok(User {
            id,
            username: self.username.clone().or_else(|| self.subject_name()),
            email: self.email.clone(),
            role: self.role.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_active: true,
        })
    }
}

/// Decode the payload segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Decode a token into a user identity, rejecting expired tokens.
pub fn decode_user(token: &str, now: DateTime<Utc>) -> Result<User, TokenError> {
    let claims = decode_claims(token)?;
    if claims.is_expired_at(now) {
        // is_expired_at only returns true when expires_at is Some
        return Err(TokenError::Expired(claims.expires_at().unwrap_or(now)));
    }
    claims.to_user()
}

/// Reject a token that is a readable JWT with an `exp` in the past.
/// Opaque tokens pass; only the server can judge them.
pub fn check_not_expired(token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
    match decode_claims(token) {
        Ok(claims) if claims.is_expired_at(now) => {
            Err(TokenError::Expired(claims.expires_at().unwrap_or(now)))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    /// Build an unsigned JWT around the given payload.
    pub(crate) fn make_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_decode_user_from_claims() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = make_token(serde_json::json!({
            "user_id": 42,
            "username": "jdoe",
            "email": "jdoe@example.com",
            "role": "manager",
            "exp": exp
        }));

        let user = decode_user(&token, Utc::now()).expect("valid token should decode");
        assert_eq!(user.id, 42);
        assert_eq!(user.username.as_deref(), Some("jdoe"));
        assert_eq!(user.role, Some(Role::Manager));
    }

    #[test]
    fn test_decode_user_from_numeric_sub() {
        let token = make_token(serde_json::json!({"sub": "17", "email": "x@y.z"}));
        let user = decode_user(&token, Utc::now()).expect("numeric sub should decode");
        assert_eq!(user.id, 17);
        assert_eq!(user.username, None);
    }

    #[test]
    fn test_decode_user_with_name_sub_requires_id() {
        let token = make_token(serde_json::json!({"sub": "jdoe"}));
        assert_eq!(
            decode_user(&token, Utc::now()),
            Err(TokenError::MissingIdentity)
        );

        let token = make_token(serde_json::json!({"sub": "jdoe", "id": 5}));
        let user = decode_user(&token, Utc::now()).expect("id alias should decode");
        assert_eq!(user.id, 5);
        assert_eq!(user.username.as_deref(), Some("jdoe"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let exp = (Utc::now() - Duration::minutes(5)).timestamp();
        let token = make_token(serde_json::json!({"user_id": 1, "exp": exp}));
        assert!(matches!(
            decode_user(&token, Utc::now()),
            Err(TokenError::Expired(_))
        ));
        assert!(check_not_expired(&token, Utc::now()).is_err());
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(decode_claims("not-a-jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(decode_claims("a.b.c.d").unwrap_err(), TokenError::Malformed);
        assert_eq!(decode_claims("a..c").unwrap_err(), TokenError::Malformed);
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(TokenError::Encoding(_))
        ));
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode_claims(&not_json), Err(TokenError::Payload(_))));
    }

    #[test]
    fn test_opaque_token_passes_expiry_check() {
        assert!(check_not_expired("opaque-session-token", Utc::now()).is_ok());
    }

    #[test]
    fn test_padded_payload_accepted() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = format!("{}==", URL_SAFE_NO_PAD.encode(r#"{"user_id":9}"#));
        let token = format!("{}.{}.sig", header, body);
        let claims = decode_claims(&token).expect("padded payload should decode");
        assert_eq!(claims.user_id, Some(9));
    }
}
