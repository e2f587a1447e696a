//! In-process fake backend for HTTP-level tests.
//!
//! Serves scripted JSON replies keyed by method and path under `/api`, and
//! records every request it sees. Unscripted routes answer 404 with a
//! FastAPI-style `detail`. A held route waits for its gate before replying.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::app::App;
use crate::config::AppConfig;
use crate::notify::RecordingNotifier;
use crate::router::history::History;
use crate::storage::MemoryStorage;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone, Default)]
struct Shared {
    replies: Arc<Mutex<HashMap<(String, String), (u16, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    gates: Arc<Mutex<HashMap<(String, String), Arc<Notify>>>>,
}

pub struct FakeBackend {
    origin: String,
    shared: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let shared = Shared::default();
        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { origin: format!("http://{addr}"), shared }
    }

    /// Base URL to configure the client with.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.origin)
    }

    /// Script the reply for `method` on `path` (path relative to `/api`).
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.shared
            .replies
            .lock()
            .unwrap()
            .insert((method.to_owned(), format!("/api{path}")), (status, body));
    }

    /// Hold replies on `method` `path` until the returned gate is notified.
    pub fn hold(&self, method: &str, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.shared
            .gates
            .lock()
            .unwrap()
            .insert((method.to_owned(), format!("/api{path}")), gate.clone());
        gate
    }

    /// Wait until at least one request to `path` has arrived.
    pub async fn arrived(&self, path: &str) {
        for _ in 0..500 {
            if !self.requests_to(path).is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no request to {path} arrived");
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Requests whose path (relative to `/api`) equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        let full = format!("/api{path}");
        self.requests().into_iter().filter(|r| r.path == full).collect()
    }
}

async fn handle(State(shared): State<Shared>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header_str = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    shared.requests.lock().unwrap().push(Recorded {
        method: method.as_str().to_owned(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    let key = (method.as_str().to_owned(), uri.path().to_owned());
    let gate = shared.gates.lock().unwrap().get(&key).cloned();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    let reply = shared
        .replies
        .lock()
        .unwrap()
        .get(&key)
        .cloned();
    match reply {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response(),
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn user_json(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.test"),
        "full_name": username.to_uppercase(),
        "role": "student",
        "is_active": true,
        "created_at": "2024-09-01T08:00:00"
    })
}

pub fn activity_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "activity_date": "2024-10-01T09:00:00",
        "location": "Main hall",
        "creator_id": 1,
        "created_at": "2024-09-20T08:00:00",
        "updated_at": null,
        "creator": user_json(1, "lin")
    })
}

pub fn media_json(id: i64) -> Value {
    json!({
        "id": id,
        "title": "Sports day",
        "description": null,
        "filename": "b1.jpg",
        "original_filename": "sports.jpg",
        "file_path": "photos/b1.jpg",
        "file_size": 4,
        "media_type": "photo",
        "activity_id": 1,
        "uploader_id": 1,
        "upload_time": "2024-10-01T12:00:00",
        "views_count": 3
    })
}

/// A fully wired client against `backend`, with recording notifier.
pub struct Harness {
    pub app: App,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub history: Arc<History>,
}

impl Harness {
    pub fn new(backend: &FakeBackend, stored_token: Option<&str>, location: &str) -> Self {
        Self::with_base_url(&backend.api_url(), stored_token, location)
    }

    pub fn with_base_url(base_url: &str, stored_token: Option<&str>, location: &str) -> Self {
        let storage = Arc::new(stored_token.map_or_else(MemoryStorage::new, MemoryStorage::with_token));
        let notifier = Arc::new(RecordingNotifier::new());
        let history = Arc::new(History::new(location));
        let config = AppConfig { api_base_url: base_url.to_owned(), ..AppConfig::default() };
        let app = App::new(config, storage.clone(), notifier.clone(), history.clone()).unwrap();
        Self { app, storage, notifier, history }
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifier.notices().into_iter().map(|n| n.message).collect()
    }
}
