//! End-to-end session behavior against a mock ticket API.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticketdesk_core::auth::{MemoryTokenStore, TokenStore};
use ticketdesk_core::forms::{LoginForm, ResetPasswordForm};
use ticketdesk_core::models::{Role, User};
use ticketdesk_core::service::{RESET_INVALID_LINK_MESSAGE, RESET_SUCCESS_MESSAGE};
use ticketdesk_core::{
    ApiClient, AuthService, GuardDecision, IdentitySource, Route, RouteGuard,
    RegistrationOutcome, ServiceError, Session, SessionStatus,
};

fn service(base_url: &str, store: &MemoryTokenStore, source: IdentitySource) -> AuthService {
    let api = ApiClient::new(base_url, Duration::from_secs(5)).expect("client should build");
    let session = Session::new(Box::new(store.clone()), source);
    AuthService::new(api, session)
}

fn jwt(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    format!("{}.{}.sig", header, URL_SAFE_NO_PAD.encode(payload.to_string()))
}

fn user_json() -> serde_json::Value {
    json!({"id": 4, "username": "jdoe", "email": "jdoe@example.com", "role": "manager"})
}

async fn mount_user(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/user/"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(server)
        .await;
}

async fn login_form_with(
    svc: &mut AuthService,
    username: &str,
    password: &str,
) -> Result<User, ServiceError> {
    svc.submit_login(&LoginForm::new(username, password)).await
}

#[tokio::test]
async fn login_persists_token_and_fetches_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_json(json!({"username": "jdoe", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "tok-1").await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;
    assert_eq!(svc.status(), &SessionStatus::Anonymous);

    let user = login_form_with(&mut svc, "jdoe", "pw").await.expect("login should succeed");
    assert_eq!(user.id, 4);
    assert_eq!(user.role, Some(Role::Manager));
    assert_eq!(svc.user().map(|u| u.id), Some(4));
    assert_eq!(store.load().expect("load").as_deref(), Some("tok-1"));
    assert_eq!(svc.api().token(), Some("tok-1"));
    assert_eq!(
        RouteGuard::authenticated().check(svc.status()),
        GuardDecision::Admit
    );
}

#[tokio::test]
async fn login_with_decode_source_skips_user_endpoint() {
    let server = MockServer::start().await;
    let token = jwt(json!({"user_id": 9, "username": "ana", "role": "admin"}));
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token.clone()})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Decode);
    svc.initialize().await;

    let user = login_form_with(&mut svc, "ana", "pw").await.expect("login should succeed");
    assert_eq!(user.id, 9);
    assert_eq!(user.role, Some(Role::Admin));
    assert_eq!(store.load().expect("load"), Some(token));
}

#[tokio::test]
async fn rejected_login_keeps_session_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad"})))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;

    let err = login_form_with(&mut svc, "jdoe", "wrong").await.expect_err("login must fail");
    assert!(matches!(err, ServiceError::InvalidCredentials));
    assert_eq!(err.user_message(), "Invalid username or password");
    assert_eq!(svc.user(), None);
    assert_eq!(store.load().expect("load"), None);
}

#[tokio::test]
async fn empty_login_form_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    let err = login_form_with(&mut svc, "jdoe", "").await.expect_err("must fail");
    assert!(err.is_validation());
}

#[tokio::test]
async fn restore_with_rejected_token_is_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token("revoked");
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    assert!(svc.session().is_loading());
    assert_eq!(
        RouteGuard::authenticated().check(svc.status()),
        GuardDecision::Wait
    );

    assert_eq!(svc.initialize().await, &SessionStatus::Anonymous);
    assert!(!svc.session().is_loading());
    assert_eq!(svc.user(), None);
    assert_eq!(store.load().expect("load"), None);
    assert_eq!(
        RouteGuard::authenticated().check(svc.status()),
        GuardDecision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn restore_with_unreachable_server_is_anonymous() {
    // Nothing listens on the discard port
    let store = MemoryTokenStore::with_token("tok");
    let mut svc = service("http://127.0.0.1:9", &store, IdentitySource::Fetch);

    assert_eq!(svc.initialize().await, &SessionStatus::Anonymous);
    assert_eq!(svc.user(), None);
    assert_eq!(store.load().expect("load"), None);
}

#[tokio::test]
async fn restore_expired_jwt_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(0)
        .mount(&server)
        .await;

    let expired = jwt(json!({"user_id": 4, "exp": chrono::Utc::now().timestamp() - 60}));
    let store = MemoryTokenStore::with_token(&expired);
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);

    assert_eq!(svc.initialize().await, &SessionStatus::Anonymous);
    assert_eq!(store.load().expect("load"), None);
}

#[tokio::test]
async fn logout_then_reload_has_no_user() {
    let server = MockServer::start().await;
    mount_user(&server, "tok-2").await;

    let store = MemoryTokenStore::with_token("tok-2");
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;
    assert_eq!(svc.user().map(|u| u.id), Some(4));

    svc.logout().expect("logout");
    assert_eq!(svc.user(), None);
    assert_eq!(svc.session().token(), None);
    assert_eq!(svc.api().token(), None);

    let mut reloaded = service(&server.uri(), &store, IdentitySource::Fetch);
    assert_eq!(reloaded.initialize().await, &SessionStatus::Anonymous);
}

#[tokio::test]
async fn unauthorized_call_clears_session_and_redirects() {
    let server = MockServer::start().await;
    mount_user(&server, "tok-3").await;
    Mock::given(method("GET"))
        .and(path("/tickets/"))
        .and(header("Authorization", "Bearer tok-3"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token("tok-3");
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;
    assert!(svc.session().is_authenticated());

    let err = svc.list_tickets().await.expect_err("401 must fail");
    assert!(matches!(err, ServiceError::SessionExpired));
    assert_eq!(err.redirect(), Some(Route::Login));
    assert_eq!(svc.user(), None);
    assert_eq!(store.load().expect("load"), None);

    // Further authenticated calls fail without touching the network
    let err = svc.list_tickets().await.expect_err("no session");
    assert_eq!(err.redirect(), Some(Route::Login));
}

#[tokio::test]
async fn authorized_call_returns_tickets() {
    let server = MockServer::start().await;
    mount_user(&server, "tok-4").await;
    Mock::given(method("GET"))
        .and(path("/tickets/"))
        .and(header("Authorization", "Bearer tok-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Printer jammed", "owner_id": 4},
            {"id": 2, "title": "VPN down", "description": "since 9am", "owner_id": 5}
        ])))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token("tok-4");
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;

    let tickets = svc.list_tickets().await.expect("tickets");
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[1].title, "VPN down");
    assert!(svc.session().is_authenticated());
}

#[tokio::test]
async fn reset_mismatch_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset-password"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service(&server.uri(), &MemoryTokenStore::new(), IdentitySource::Fetch);
    let mut form = ResetPasswordForm::new(Some("reset-tok".to_string()));
    for c in "abc123".chars() {
        form.fields.type_char(c);
    }
    form.fields.focus_next();
    for c in "abc124".chars() {
        form.fields.type_char(c);
    }

    let result = svc.submit_reset(&form).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(AuthService::reset_message(&result).contains("do not match"));
}

#[tokio::test]
async fn reset_success_and_invalid_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset-password"))
        .and(body_json(json!({"token": "good", "password": "newpass"})))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reset-password"))
        .and(body_json(json!({"token": "stale", "password": "newpass"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;

    let svc = service(&server.uri(), &MemoryTokenStore::new(), IdentitySource::Fetch);
    for (token, expected) in [("good", RESET_SUCCESS_MESSAGE), ("stale", RESET_INVALID_LINK_MESSAGE)] {
        let mut form = ResetPasswordForm::new(Some(token.to_string()));
        for c in "newpass".chars() {
            form.fields.type_char(c);
        }
        form.fields.focus_next();
        for c in "newpass".chars() {
            form.fields.type_char(c);
        }
        let result = svc.submit_reset(&form).await;
        assert_eq!(AuthService::reset_message(&result), expected);
    }
}

#[tokio::test]
async fn register_with_token_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .and(body_json(json!({"username": "jdoe", "email": "jdoe@example.com", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"username": "jdoe", "token": "tok-5"})),
        )
        .mount(&server)
        .await;
    mount_user(&server, "tok-5").await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;

    let registration = ticketdesk_core::forms::Registration {
        username: "jdoe".to_string(),
        email: "jdoe@example.com".to_string(),
        password: "pw".to_string(),
    };
    let outcome = svc.register(&registration).await.expect("register");
    assert!(matches!(outcome, RegistrationOutcome::SignedIn(ref u) if u.id == 4));
    assert_eq!(store.load().expect("load").as_deref(), Some("tok-5"));
}

#[tokio::test]
async fn register_without_token_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 8, "email": "a@b.co"})))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let mut svc = service(&server.uri(), &store, IdentitySource::Fetch);
    svc.initialize().await;

    let registration = ticketdesk_core::forms::Registration {
        username: "a".to_string(),
        email: "a@b.co".to_string(),
        password: "pw".to_string(),
    };
    let outcome = svc.register(&registration).await.expect("register");
    assert_eq!(outcome, RegistrationOutcome::Registered);
    assert_eq!(svc.user(), None);
    assert_eq!(store.load().expect("load"), None);
}
