#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use imagegen_router::api::routes::{router, AppState};
use imagegen_router::BackendSettings;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const TOKEN: &str = "r8_test_token";

/// Serve `app` on an ephemeral local port; returns its base URL.
pub fn spawn_upstream(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
    tokio::spawn(async move {
        server.await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn settings(replicate_url: &str, a1111_url: &str) -> BackendSettings {
    BackendSettings {
        replicate_token: Some(TOKEN.to_string()),
        replicate_api_url: replicate_url.to_string(),
        poll_interval: Duration::from_millis(5),
        a1111_base_url: a1111_url.to_string(),
    }
}

pub fn app(settings: BackendSettings) -> Router {
    router(Arc::new(AppState::with_settings(settings)))
}

pub async fn send(app: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Body::from(body.to_string())).await
}

// Replicate

pub struct ReplicateMock {
    pub upload_status: StatusCode,
    pub predict_status: StatusCode,
    pub polls_before_done: usize,
    pub final_prediction: Value,
    pub uploads: AtomicUsize,
    pub created: AtomicUsize,
    pub polls: AtomicUsize,
    pub auth_headers: Mutex<Vec<String>>,
    pub upload_bodies: Mutex<Vec<Value>>,
    pub prediction_bodies: Mutex<Vec<Value>>,
    pub polled_ids: Mutex<Vec<String>>,
}

impl ReplicateMock {
    pub fn finishing_with(polls_before_done: usize, final_prediction: Value) -> Self {
        ReplicateMock {
            upload_status: StatusCode::OK,
            predict_status: StatusCode::CREATED,
            polls_before_done,
            final_prediction,
            uploads: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            auth_headers: Mutex::new(Vec::new()),
            upload_bodies: Mutex::new(Vec::new()),
            prediction_bodies: Mutex::new(Vec::new()),
            polled_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.uploads.load(Ordering::SeqCst),
            self.created.load(Ordering::SeqCst),
            self.polls.load(Ordering::SeqCst),
        )
    }

    fn record_auth(&self, headers: &HeaderMap) {
        if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.auth_headers.lock().unwrap().push(auth.to_string());
        }
    }
}

pub fn spawn_replicate(mock: Arc<ReplicateMock>) -> String {
    let app = Router::new()
        .route("/files", post(replicate_upload))
        .route("/predictions", post(replicate_create))
        .route("/predictions/:id", get(replicate_poll))
        .layer(DefaultBodyLimit::disable())
        .with_state(mock);
    spawn_upstream(app)
}

async fn replicate_upload(
    State(mock): State<Arc<ReplicateMock>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.uploads.fetch_add(1, Ordering::SeqCst);
    mock.record_auth(&headers);
    mock.upload_bodies.lock().unwrap().push(body);
    if !mock.upload_status.is_success() {
        return (mock.upload_status, "quota exceeded").into_response();
    }
    Json(json!({ "id": "file-123", "name": "input.png" })).into_response()
}

async fn replicate_create(
    State(mock): State<Arc<ReplicateMock>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.created.fetch_add(1, Ordering::SeqCst);
    mock.record_auth(&headers);
    mock.prediction_bodies.lock().unwrap().push(body);
    if !mock.predict_status.is_success() {
        return (mock.predict_status, "invalid version").into_response();
    }
    (mock.predict_status, Json(json!({ "id": "pred-1", "status": "starting" }))).into_response()
}

async fn replicate_poll(
    State(mock): State<Arc<ReplicateMock>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Json<Value> {
    let n = mock.polls.fetch_add(1, Ordering::SeqCst) + 1;
    mock.record_auth(&headers);
    mock.polled_ids.lock().unwrap().push(id.clone());
    if n <= mock.polls_before_done {
        Json(json!({ "id": id, "status": "processing" }))
    } else {
        Json(mock.final_prediction.clone())
    }
}

// Automatic1111

pub struct A1111Mock {
    pub status: StatusCode,
    pub response: Value,
    pub calls: AtomicUsize,
    pub bodies: Mutex<Vec<Value>>,
}

impl A1111Mock {
    pub fn responding(status: StatusCode, response: Value) -> Self {
        A1111Mock { status, response, calls: AtomicUsize::new(0), bodies: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn spawn_a1111(mock: Arc<A1111Mock>) -> String {
    let app = Router::new()
        .route("/sdapi/v1/img2img", post(a1111_img2img))
        .layer(DefaultBodyLimit::disable())
        .with_state(mock);
    spawn_upstream(app)
}

async fn a1111_img2img(State(mock): State<Arc<A1111Mock>>, Json(body): Json<Value>) -> Response {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    mock.bodies.lock().unwrap().push(body);
    if !mock.status.is_success() {
        return (mock.status, "CUDA out of memory").into_response();
    }
    Json(mock.response.clone()).into_response()
}
