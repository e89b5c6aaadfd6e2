// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end capture flows over the HTTP API.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use habitat_capture::config::Config;
use serde_json::json;

mod common;

/// Config whose upstream services refuse connections.
fn offline_config() -> Config {
    Config {
        parcel_service_url: "http://127.0.0.1:1".to_string(),
        place_lookup_url: "http://127.0.0.1:1".to_string(),
        ..Config::test_default()
    }
}

#[tokio::test]
async fn test_health() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["overlay_parcels"], 0);
}

#[tokio::test]
async fn test_initial_map_state() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "navigation");
    assert_eq!(body["surface"]["navigation_enabled"], true);
    assert_eq!(body["surface"]["cursor"], "grab");
    assert_eq!(body["locate"]["status"], "off");
    assert_eq!(body["polygon"]["vertices"], json!([]));
}

#[tokio::test]
async fn test_capture_close_and_save_flow() {
    let lookup = Router::new().route(
        "/lookup",
        get(|| async {
            Json(json!({"place": "Alpe", "municipality": "Castelrotto", "elevation": 1850}))
        }),
    );
    let lookup_url = common::spawn_upstream(lookup).await;
    let (app, _state) = common::create_test_app_with(Config {
        place_lookup_url: lookup_url,
        ..offline_config()
    });

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/mode",
        Some(json!({"mode": "polygon_editing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "polygon_editing");

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["surface"]["navigation_enabled"], false);
    assert_eq!(map["surface"]["cursor"], "crosshair");
    assert_eq!(map["drawing_hint_visible"], true);

    for (lat, lng) in [(46.72, 11.65), (46.72, 11.66), (46.73, 11.66)] {
        let (status, body) = common::send(
            &app,
            "POST",
            "/api/map/click",
            Some(json!({"latitude": lat, "longitude": lng, "at_ms": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "vertex_added");
    }

    // Clicking the first vertex closes the ring
    let (_, body) = common::send(
        &app,
        "POST",
        "/api/map/click",
        Some(json!({"latitude": 46.72, "longitude": 11.65, "at_ms": 0})),
    )
    .await;
    assert_eq!(body["outcome"], "polygon_closed");
    assert!(body["area_sq_meters"].as_u64().unwrap() > 0);

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["mode"], "idle");
    assert_eq!(map["polygon"]["closed"], true);
    assert_eq!(map["surface"]["navigation_enabled"], true);

    let (status, saved) = common::send(&app, "POST", "/api/polygon/save", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["snapshot"]["vertices"].as_array().unwrap().len(), 4);
    assert_eq!(saved["geojson"]["type"], "Feature");
    assert_eq!(saved["place"]["place"], "Alpe");
    assert_eq!(saved["place"]["elevation"], "1850");

    let (_, events) = common::send(&app, "GET", "/api/events", None).await;
    let types: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"polygon_change"));
    assert!(types.contains(&"area_change"));

    // Drained
    let (_, events) = common::send(&app, "GET", "/api/events", None).await;
    assert_eq!(events, json!([]));
}

#[tokio::test]
async fn test_close_with_two_points_rejected() {
    let (app, _state) = common::create_test_app_with(offline_config());
    common::send(&app, "POST", "/api/mode", Some(json!({"mode": "polygon_editing"}))).await;
    for lng in [11.65, 11.66] {
        common::send(
            &app,
            "POST",
            "/api/polygon/vertices",
            Some(json!({"latitude": 46.72, "longitude": lng})),
        )
        .await;
    }

    let (status, body) = common::send(&app, "POST", "/api/polygon/close", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_vertices");
    assert!(body["details"].as_str().unwrap().contains("Insufficient points"));

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["banner"]["code"], "insufficient_vertices");
    assert_eq!(map["polygon"]["area_sq_meters"], 0);
}

#[tokio::test]
async fn test_save_unclosed_rejected() {
    let (app, _state) = common::create_test_app_with(offline_config());
    common::send(&app, "POST", "/api/mode", Some(json!({"mode": "polygon_editing"}))).await;
    for (lat, lng) in [(46.72, 11.65), (46.72, 11.66), (46.73, 11.66)] {
        common::send(
            &app,
            "POST",
            "/api/polygon/vertices",
            Some(json!({"latitude": lat, "longitude": lng})),
        )
        .await;
    }
    let (status, body) = common::send(&app, "POST", "/api/polygon/save", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unclosed_polygon");
}

#[tokio::test]
async fn test_mutation_outside_editing_conflicts() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(
        &app,
        "POST",
        "/api/polygon/vertices",
        Some(json!({"latitude": 1.0, "longitude": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "not_editing");

    let (status, body) =
        common::send(&app, "POST", "/api/mode", Some(json!({"mode": "idle"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_mode_target");
}

#[tokio::test]
async fn test_invalid_coordinate_rejected() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, _) = common::send(
        &app,
        "POST",
        "/api/map/click",
        Some(json!({"latitude": 123.0, "longitude": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_drag_vertex_requires_closed_polygon() {
    let (app, _state) = common::create_test_app_with(offline_config());
    common::send(&app, "POST", "/api/mode", Some(json!({"mode": "polygon_editing"}))).await;
    common::send(
        &app,
        "POST",
        "/api/polygon/vertices",
        Some(json!({"latitude": 1.0, "longitude": 1.0})),
    )
    .await;
    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/polygon/vertices/0",
        Some(json!({"latitude": 2.0, "longitude": 2.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "polygon_not_closed");
}

#[tokio::test]
async fn test_load_then_edit_stored_polygon() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(
        &app,
        "POST",
        "/api/polygon/load",
        Some(json!({"vertices": [
            {"lat": 46.72, "lng": 11.65},
            {"lat": 46.72, "lng": 11.66},
            {"lat": 46.73, "lng": 11.66}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed"], true);
    assert_eq!(body["vertices"].as_array().unwrap().len(), 4);

    // Re-entering editing resumes with drag handles
    common::send(&app, "POST", "/api/mode", Some(json!({"mode": "polygon_editing"}))).await;
    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["surface"]["vertex_handles"], true);

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/polygon/vertices/1",
        Some(json!({"latitude": 46.715, "longitude": 11.665})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vertices"][1]["latitude"], 46.715);

    let (status, body) = common::send(&app, "POST", "/api/polygon/restart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vertices"], json!([]));
}

#[tokio::test]
async fn test_load_unusable_polygon() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(
        &app,
        "POST",
        "/api/polygon/load",
        Some(json!({"vertices": [[1.0, 1.0], "garbage"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_stored_geometry");

    let (_, polygon) = common::send(&app, "GET", "/api/polygon", None).await;
    assert_eq!(polygon["vertices"], json!([]));
}

#[tokio::test]
async fn test_location_samples_center_once() {
    let (app, _state) = common::create_test_app_with(offline_config());

    let (status, _) = common::send(&app, "POST", "/api/location/recenter", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/location/samples",
        Some(json!({"latitude": 46.72, "longitude": 11.65, "accuracy_meters": 5.0, "captured_at_ms": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forwarded"], false);
    assert_eq!(body["position"]["latitude"], 46.72);
    assert_eq!(body["locate"]["status"], "tracking");

    let (_, events) = common::send(&app, "GET", "/api/events", None).await;
    let types: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["center_change", "zoom_change"]);

    let (status, body) = common::send(&app, "POST", "/api/location/recenter", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 46.72);
}

#[tokio::test]
async fn test_location_error_degrades_to_manual() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (_, body) = common::send(
        &app,
        "POST",
        "/api/location/error",
        Some(json!({"error": "permission_denied"})),
    )
    .await;
    assert_eq!(body["locate"]["status"], "failed");
    assert_eq!(body["locate"]["error"], "permission_denied");

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["banner"]["code"], "location_permission_denied");

    let (status, _) = common::send(&app, "DELETE", "/api/banner", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert!(map["banner"].is_null());
}

#[tokio::test]
async fn test_location_feed_start_and_stop() {
    let (app, state) = common::create_test_app_with(offline_config());

    let (_, body) = common::send(&app, "POST", "/api/location/start", None).await;
    assert_eq!(body["forwarded"], false);
    assert!(state.location.is_subscribed());

    let (_, body) = common::send(
        &app,
        "POST",
        "/api/location/samples",
        Some(json!({"latitude": 46.72, "longitude": 11.65, "accuracy_meters": 5.0, "captured_at_ms": 0})),
    )
    .await;
    assert_eq!(body["forwarded"], true);

    common::send(&app, "POST", "/api/location/stop", None).await;
    for _ in 0..100 {
        if !state.location.is_subscribed() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(!state.location.is_subscribed());
}

#[tokio::test]
async fn test_parcel_refresh_failure_keeps_map_usable() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(&app, "POST", "/api/parcels/refresh", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "parcel_fetch_failed");

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["banner"]["code"], "parcel_fetch_failed");
    let (status, _) = common::send(
        &app,
        "POST",
        "/api/mode",
        Some(json!({"mode": "polygon_editing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_parcel_refresh_and_selection() {
    let directory = Router::new().route(
        "/parcels",
        get(|| async {
            Json(json!([
                common::parcel_json("p1", 10.0, 10.0, "legally-protected", true),
                common::parcel_json("p2", 20.0, 20.0, "ecologically-low-value", false)
            ]))
        }),
    );
    let url = common::spawn_upstream(directory).await;
    let (app, _state) = common::create_test_app_with(Config {
        parcel_service_url: url,
        ..offline_config()
    });

    let (status, body) =
        common::send(&app, "POST", "/api/parcels/refresh?exclude_id=p9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drawable"], 2);

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["surface"]["shapes"]["p1"]["style"]["fill_color"], "#d32f2f");
    assert_eq!(map["surface"]["shapes"]["p2"]["style"]["fill_opacity"], 0.3);

    let (_, body) = common::send(&app, "POST", "/api/parcels/p2/click", None).await;
    assert_eq!(body["outcome"], "parcel_selected");
    assert_eq!(body["id"], "p2");

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["mode"], "idle");
    assert_eq!(map["selected_parcel"], "p2");

    let (_, body) = common::send(&app, "POST", "/api/parcels/nope/click", None).await;
    assert_eq!(body["outcome"], "ignored");
}

#[tokio::test]
async fn test_place_lookup_failure_degrades() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, body) = common::send(&app, "GET", "/api/place?lat=46.5&lng=11.3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["place"]["place"], "unknown");

    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["banner"]["code"], "lookup_failed");
}

#[tokio::test]
async fn test_preferences_roundtrip() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (_, body) = common::send(&app, "DELETE", "/api/preferences/drawing-hint", None).await;
    assert_eq!(body["show_drawing_hint"], false);

    let (_, body) = common::send(
        &app,
        "PUT",
        "/api/preferences",
        Some(json!({"show_drawing_hint": true, "show_overlay_legend": false})),
    )
    .await;
    assert_eq!(body["show_overlay_legend"], false);
    assert_eq!(body["show_drawing_hint"], true);
}

#[tokio::test]
async fn test_protection_status_colors_draft() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let (status, _) = common::send(
        &app,
        "PUT",
        "/api/polygon/protection-status",
        Some(json!({"status": "legally_protected"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, map) = common::send(&app, "GET", "/api/map", None).await;
    assert_eq!(map["protection_status"], "legally-protected");
    assert_eq!(map["surface"]["draft"]["fill_color"], "#d32f2f");

    let (status, _) = common::send(
        &app,
        "PUT",
        "/api/polygon/protection-status",
        Some(json!({"status": "sacred grove"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_security_headers_applied() {
    let (app, _state) = common::create_test_app_with(offline_config());
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
}
