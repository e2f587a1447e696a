use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use super::*;
use crate::net::error::{MSG_NOT_FOUND, MSG_PERMISSION_DENIED, MSG_REQUEST_FAILED, MSG_SERVER_ERROR, MSG_SESSION_EXPIRED};
use crate::notify::{NoticeLevel, RecordingNotifier};
use crate::router::history::History;
use crate::test_support::FakeBackend;

#[derive(Default)]
struct CountingTokens {
    token: Mutex<Option<String>>,
    invalidations: AtomicUsize,
}

impl CountingTokens {
    fn with(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_owned())), invalidations: AtomicUsize::new(0) }
    }
}

impl TokenProvider for CountingTokens {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn invalidate(&self) {
        *self.token.lock().unwrap() = None;
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    client: HttpClient,
    tokens: Arc<CountingTokens>,
    notifier: Arc<RecordingNotifier>,
    history: Arc<History>,
}

fn fixture(base_url: &str, tokens: CountingTokens, location: &str) -> Fixture {
    let tokens = Arc::new(tokens);
    let notifier = Arc::new(RecordingNotifier::new());
    let history = Arc::new(History::new(location));
    let config = AppConfig { api_base_url: base_url.to_owned(), ..AppConfig::default() };
    let client = HttpClient::new(&config, tokens.clone(), notifier.clone(), history.clone()).unwrap();
    Fixture { client, tokens, notifier, history }
}

// =============================================================
// Query
// =============================================================

#[test]
fn query_keeps_insertion_order() {
    let mut query = Query::new().with("page", 2);
    query.push("size", 10);
    assert_eq!(query.pairs(), &[("page".to_owned(), "2".to_owned()), ("size".to_owned(), "10".to_owned())]);
    assert!(!query.is_empty());
    assert!(Query::new().is_empty());
}

#[test]
fn url_joins_base_and_path() {
    let fx = fixture("http://backend.test/api/", CountingTokens::default(), "/");
    assert_eq!(fx.client.base_url(), "http://backend.test/api");
    assert_eq!(fx.client.url("/activities/"), "http://backend.test/api/activities/");
}

// =============================================================
// Request interception
// =============================================================

#[tokio::test]
async fn attaches_bearer_token_when_present() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/auth/me", 200, json!({ "id": 1 }));
    let fx = fixture(&backend.api_url(), CountingTokens::with("T"), "/");

    let _: Value = fx.client.get("/auth/me", None).await.unwrap();

    let requests = backend.requests_to("/auth/me");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer T"));
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let backend = FakeBackend::start().await;
    backend.respond("POST", "/auth/login", 200, json!({}));
    let fx = fixture(&backend.api_url(), CountingTokens::default(), "/login");

    let _: Value = fx.client.post("/auth/login", &json!({ "username": "a" })).await.unwrap();

    let request = &backend.requests_to("/auth/login")[0];
    assert_eq!(request.authorization, None);
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(serde_json::from_slice::<Value>(&request.body).unwrap(), json!({ "username": "a" }));
}

#[tokio::test]
async fn get_passes_query_through_and_returns_body_unmodified() {
    let backend = FakeBackend::start().await;
    let body = json!([{ "id": 1, "title": "Picnic", "extra": { "nested": [1, 2] } }]);
    backend.respond("GET", "/activities/", 200, body.clone());
    let fx = fixture(&backend.api_url(), CountingTokens::with("T"), "/activities");

    let query = Query::new().with("page", 2).with("size", 10);
    let got: Value = fx.client.get("/activities/", Some(&query)).await.unwrap();

    assert_eq!(got, body);
    let request = &backend.requests_to("/activities/")[0];
    assert_eq!(request.query.as_deref(), Some("page=2&size=10"));
}

#[tokio::test]
async fn empty_query_adds_no_question_mark() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/users/", 200, json!([]));
    let fx = fixture(&backend.api_url(), CountingTokens::with("T"), "/");

    let _: Value = fx.client.get("/users/", Some(&Query::new())).await.unwrap();

    assert_eq!(backend.requests_to("/users/")[0].query, None);
}

// =============================================================
// Response interception: 401
// =============================================================

#[tokio::test]
async fn unauthorized_invalidates_once_and_redirects_to_login() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/users/", 401, json!({ "detail": "Could not validate credentials" }));
    let fx = fixture(&backend.api_url(), CountingTokens::with("stale"), "/classmates");

    let err = fx.client.get::<Value>("/users/", None).await.unwrap_err();

    assert!(matches!(err, ApiError::AuthenticationExpired { .. }));
    assert_eq!(fx.tokens.invalidations.load(Ordering::SeqCst), 1);
    assert_eq!(fx.tokens.token(), None);
    assert_eq!(fx.history.current_path(), LOGIN_PATH);
    let notices = fx.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, MSG_SESSION_EXPIRED);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn unauthorized_on_login_page_is_silent() {
    let backend = FakeBackend::start().await;
    backend.respond("POST", "/auth/login", 401, json!({ "detail": "Incorrect username or password" }));
    let fx = fixture(&backend.api_url(), CountingTokens::default(), "/login?from=/profile");

    let err = fx.client.post::<_, Value>("/auth/login", &json!({})).await.unwrap_err();

    assert_eq!(err.detail(), Some("Incorrect username or password"));
    assert_eq!(fx.tokens.invalidations.load(Ordering::SeqCst), 1);
    assert!(fx.notifier.notices().is_empty());
    assert_eq!(fx.history.entries(), vec!["/login?from=/profile"]);
}

#[tokio::test]
async fn each_unauthorized_response_invalidates_once() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/notifications/", 401, json!({ "detail": "expired" }));
    let fx = fixture(&backend.api_url(), CountingTokens::with("stale"), "/");

    let _ = fx.client.get::<Value>("/notifications/", None).await;
    let _ = fx.client.get::<Value>("/notifications/", None).await;

    assert_eq!(fx.tokens.invalidations.load(Ordering::SeqCst), 2);
}

// =============================================================
// Response interception: other statuses
// =============================================================

#[tokio::test]
async fn fixed_messages_for_forbidden_missing_and_server_errors() {
    let backend = FakeBackend::start().await;
    backend.respond("DELETE", "/activities/1", 403, json!({ "detail": "not yours" }));
    backend.respond("GET", "/media/2", 500, json!({ "detail": "boom" }));
    let fx = fixture(&backend.api_url(), CountingTokens::with("T"), "/");

    let forbidden = fx.client.delete::<Value>("/activities/1").await.unwrap_err();
    let missing = fx.client.get::<Value>("/comments/99", None).await.unwrap_err();
    let server = fx.client.get::<Value>("/media/2", None).await.unwrap_err();

    assert!(matches!(forbidden, ApiError::PermissionDenied { .. }));
    assert!(matches!(missing, ApiError::NotFound { .. }));
    assert!(matches!(server, ApiError::ServerError { status: 500, .. }));
    let messages: Vec<String> = fx.notifier.notices().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec![MSG_PERMISSION_DENIED, MSG_NOT_FOUND, MSG_SERVER_ERROR]);
    assert_eq!(fx.tokens.invalidations.load(Ordering::SeqCst), 0);
    assert_eq!(fx.history.current_path(), "/");
}

#[tokio::test]
async fn other_failures_show_backend_detail_or_generic() {
    let backend = FakeBackend::start().await;
    backend.respond("POST", "/auth/register", 400, json!({ "detail": "Username already registered" }));
    backend.respond("POST", "/comments/", 422, json!({ "unexpected": true }));
    let fx = fixture(&backend.api_url(), CountingTokens::default(), "/register");

    let with_detail = fx.client.post::<_, Value>("/auth/register", &json!({})).await.unwrap_err();
    let without = fx.client.post::<_, Value>("/comments/", &json!({})).await.unwrap_err();

    assert!(matches!(with_detail, ApiError::RequestFailed { status: 400, .. }));
    assert!(matches!(without, ApiError::RequestFailed { status: 422, detail: None }));
    let messages: Vec<String> = fx.notifier.notices().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Username already registered", MSG_REQUEST_FAILED]);
}

#[tokio::test]
async fn transport_failure_is_reported_generically() {
    let fx = fixture("http://127.0.0.1:1/api", CountingTokens::with("T"), "/");

    let err = fx.client.get::<Value>("/auth/me", None).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(fx.notifier.notices()[0].message, MSG_REQUEST_FAILED);
    assert_eq!(fx.tokens.invalidations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn decode_failure_is_not_reported() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/users/stats/summary", 200, json!({ "total": "many" }));
    let fx = fixture(&backend.api_url(), CountingTokens::with("T"), "/");

    let err = fx.client.get::<crate::net::types::UserStats>("/users/stats/summary", None).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
    assert!(fx.notifier.notices().is_empty());
}
