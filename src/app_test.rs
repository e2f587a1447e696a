use serde_json::json;

use super::*;
use crate::notify::RecordingNotifier;
use crate::storage::{MemoryStorage, TOKEN_KEY};
use crate::test_support::{FakeBackend, Harness, user_json};

#[test]
fn new_seeds_session_from_storage() {
    let storage = Arc::new(MemoryStorage::with_token("T"));
    let app = App::new(
        AppConfig::default(),
        storage,
        Arc::new(RecordingNotifier::new()),
        Arc::new(History::default()),
    )
    .unwrap();

    assert_eq!(app.auth.token().as_deref(), Some("T"));
    assert!(!app.auth.is_authenticated());
    assert_eq!(app.api.http().base_url(), crate::config::DEFAULT_API_BASE_URL);
}

#[tokio::test]
async fn login_token_is_used_by_later_requests() {
    let backend = FakeBackend::start().await;
    backend.respond("POST", "/auth/login", 200, json!({ "access_token": "fresh", "user": user_json(1, "lin") }));
    backend.respond("GET", "/activities/", 200, json!([]));
    let h = Harness::new(&backend, None, "/login");

    let credentials = crate::net::types::Credentials { username: "lin".to_owned(), password: "pw".to_owned() };
    assert!(h.app.auth.login(&credentials).await);
    h.app.api.activities().list(&crate::net::http::Query::new()).await.unwrap();

    let request = &backend.requests_to("/activities/")[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn unauthorized_response_clears_shared_session() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/auth/me", 200, user_json(1, "lin"));
    backend.respond("GET", "/notifications/", 401, json!({ "detail": "expired" }));
    let h = Harness::new(&backend, Some("T"), "/");
    assert!(h.app.auth.initialize_auth().await);

    let _ = h.app.api.notifications().list(&crate::net::http::Query::new()).await;

    assert!(!h.app.auth.is_authenticated());
    assert_eq!(h.app.session.snapshot().user, None);
    assert_eq!(crate::storage::Storage::get_item(h.storage.as_ref(), TOKEN_KEY), None);
    assert_eq!(h.history.entries(), vec!["/", "/login"]);
}
