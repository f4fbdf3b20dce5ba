#![allow(dead_code)]

//! Mock login/validation service for harness e2e tests.
//!
//! Stands in for the real target: issues a `_d` session cookie on login
//! when the XSRF header is present, and accepts a validation GET only for
//! cookies it issued.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

#[derive(Default)]
pub struct MockService {
    /// Total login attempts received.
    pub logins: AtomicUsize,
    /// When set, every login is rejected with a 401.
    pub reject_logins: AtomicBool,
    /// Session cookie values handed out.
    pub issued: Mutex<Vec<String>>,
    /// Session cookie values seen on the validation endpoint, in order.
    pub validated: Mutex<Vec<String>>,
}

#[derive(serde::Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<MockService>>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> impl IntoResponse {
    let n = state.logins.fetch_add(1, Ordering::SeqCst);

    if headers.get("x-xsrf-token").is_none() {
        return (StatusCode::FORBIDDEN, "missing xsrf token").into_response();
    }
    if payload.username.is_empty() || payload.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing credentials").into_response();
    }
    if state.reject_logins.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }

    let cookie = format!("sess-{n}");
    state.issued.lock().unwrap().push(cookie.clone());

    let mut resp_headers = HeaderMap::new();
    resp_headers.insert(
        header::SET_COOKIE,
        format!("_d={cookie}; Path=/").parse().unwrap(),
    );
    (StatusCode::OK, resp_headers, "ok").into_response()
}

async fn current_user(State(state): State<Arc<MockService>>, headers: HeaderMap) -> StatusCode {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let session = cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "_d").then(|| value.to_string())
    });

    match session {
        Some(value) => {
            state.validated.lock().unwrap().push(value.clone());
            if state.issued.lock().unwrap().contains(&value) {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            }
        }
        None => StatusCode::BAD_REQUEST,
    }
}

/// Start the mock service on an ephemeral port. Returns its base URL and
/// the shared state for assertions.
pub async fn start_mock_service() -> (String, Arc<MockService>) {
    let state = Arc::new(MockService::default());
    let app = Router::new()
        .route("/api/v2/login", post(login))
        .route("/api/v2/users/current", get(current_user))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), state)
}
