// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use habitat_capture::config::Config;
use habitat_capture::models::UserPreferences;
use habitat_capture::routes::create_router;
use habitat_capture::session::CaptureSession;
use habitat_capture::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app whose upstream services are unreachable.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

/// Create a test app with a custom config (e.g. pointing at a mock upstream).
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let session = CaptureSession::headless(&config, UserPreferences::default());
    let state = Arc::new(AppState::new(config, session));
    (create_router(state.clone()), state)
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Send a request with an optional JSON body; returns status and parsed body.
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Parcel record JSON for a small square at (lat, lng).
#[allow(dead_code)]
pub fn parcel_json(id: &str, lat: f64, lng: f64, status: &str, verified: bool) -> Value {
    serde_json::json!({
        "id": id,
        "name": format!("Parcel {}", id),
        "polygon": [
            [lat, lng],
            [lat, lng + 0.01],
            [lat + 0.01, lng + 0.01],
            [lat + 0.01, lng]
        ],
        "protection_status": status,
        "verified": verified
    })
}
