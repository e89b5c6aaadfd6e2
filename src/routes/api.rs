// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes driving the capture session.

use crate::error::{AppError, CaptureError, LocationError, Result};
use crate::events::MapEvent;
use crate::models::{
    FilterStats, FilteredPosition, MapMode, ParcelFilter, PlaceInfo, PolygonSnapshot,
    PositionSample, ProtectionStatus, UserPreferences, Vertex,
};
use crate::services::LocationFeed;
use crate::session::{Banner, CaptureSession, ClickOutcome, LocateStatus};
use crate::surface::{SurfaceState, Viewport};
use crate::time_utils::now_millis;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/map", get(get_map))
        .route("/api/mode", post(set_mode))
        .route("/api/map/click", post(map_click))
        .route("/api/viewport", post(viewport_changed))
        .route("/api/polygon", get(get_polygon))
        .route("/api/polygon/vertices", post(add_vertex))
        .route("/api/polygon/vertices/last", delete(undo_vertex))
        .route("/api/polygon/vertices/{index}", put(drag_vertex))
        .route("/api/polygon/close", post(close_polygon))
        .route("/api/polygon/restart", post(restart_polygon))
        .route("/api/polygon/save", post(save_polygon))
        .route("/api/polygon/load", post(load_polygon))
        .route(
            "/api/polygon/protection-status",
            put(set_protection_status),
        )
        .route("/api/location/samples", post(push_sample))
        .route("/api/location/error", post(push_location_error))
        .route("/api/location/start", post(start_location))
        .route("/api/location/stop", post(stop_location))
        .route("/api/location/recenter", post(recenter))
        .route("/api/parcels/refresh", post(refresh_parcels))
        .route("/api/parcels/{id}/click", post(parcel_click))
        .route("/api/place", get(get_place))
        .route("/api/events", get(drain_events))
        .route("/api/banner", delete(dismiss_banner))
        .route("/api/preferences", put(set_preferences))
        .route("/api/preferences/drawing-hint", delete(dismiss_drawing_hint))
}

// ─── Map State ───────────────────────────────────────────────

/// Polygon as seen by the form.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PolygonResponse {
    pub vertices: Vec<Vertex>,
    pub closed: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub area_sq_meters: u64,
    pub area_hectares: f64,
}

impl PolygonResponse {
    fn from_session(session: &CaptureSession) -> Self {
        let area = session.area();
        Self {
            vertices: session.extract_points(),
            closed: session.engine().is_closed(),
            area_sq_meters: area.square_meters(),
            area_hectares: area.hectares(),
        }
    }
}

/// Full widget state for rendering.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapStateResponse {
    pub mode: MapMode,
    pub surface: SurfaceState,
    pub viewport: Viewport,
    pub polygon: PolygonResponse,
    pub position: Option<FilteredPosition>,
    pub filter: FilterStats,
    pub locate: LocateStatus,
    pub banner: Option<Banner>,
    pub selected_parcel: Option<String>,
    pub protection_status: Option<ProtectionStatus>,
    pub preferences: UserPreferences,
    pub drawing_hint_visible: bool,
}

impl MapStateResponse {
    fn from_session(session: &CaptureSession) -> Self {
        Self {
            mode: session.mode(),
            surface: session.surface().clone(),
            viewport: session.viewport(),
            polygon: PolygonResponse::from_session(session),
            position: session.current_position(),
            filter: session.filter_stats(),
            locate: session.locate_status(),
            banner: session.banner().cloned(),
            selected_parcel: session.selected_parcel().map(str::to_string),
            protection_status: session.protection_status(),
            preferences: session.preferences().clone(),
            drawing_hint_visible: session.drawing_hint_visible(),
        }
    }
}

async fn get_map(State(state): State<Arc<AppState>>) -> Json<MapStateResponse> {
    let session = state.session.lock().await;
    Json(MapStateResponse::from_session(&session))
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: MapMode,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ModeResponse {
    pub previous: MapMode,
    pub mode: MapMode,
}

/// Press a mode toggle.
async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ModeRequest>,
) -> Result<Json<ModeResponse>> {
    let transition = state.session.lock().await.toggle_mode(body.mode)?;
    Ok(Json(ModeResponse {
        previous: transition.from,
        mode: transition.to,
    }))
}

// ─── Clicks & Viewport ───────────────────────────────────────

#[derive(Deserialize)]
struct ClickRequest {
    latitude: f64,
    longitude: f64,
    /// Client click time; server time when absent
    at_ms: Option<i64>,
}

async fn map_click(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClickRequest>,
) -> Result<Json<ClickOutcome>> {
    let point = Vertex::new(body.latitude, body.longitude);
    if !point.is_valid() {
        return Err(AppError::BadRequest(format!(
            "Invalid coordinate: {}, {}",
            body.latitude, body.longitude
        )));
    }
    let at_ms = body.at_ms.unwrap_or_else(now_millis);
    let outcome = state.session.lock().await.map_click(point, at_ms)?;
    Ok(Json(outcome))
}

#[derive(Deserialize, Default)]
struct ParcelClickRequest {
    at_ms: Option<i64>,
}

async fn parcel_click(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ParcelClickRequest>>,
) -> Json<ClickOutcome> {
    let Json(body) = body.unwrap_or_default();
    let at_ms = body.at_ms.unwrap_or_else(now_millis);
    Json(state.session.lock().await.parcel_click(&id, at_ms))
}

async fn viewport_changed(
    State(state): State<Arc<AppState>>,
    Json(viewport): Json<Viewport>,
) -> Result<StatusCode> {
    if !viewport.center.is_valid() || !viewport.zoom.is_finite() {
        return Err(AppError::BadRequest("Invalid viewport".to_string()));
    }
    state.session.lock().await.viewport_changed(viewport);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Polygon ─────────────────────────────────────────────────

async fn get_polygon(State(state): State<Arc<AppState>>) -> Json<PolygonResponse> {
    let session = state.session.lock().await;
    Json(PolygonResponse::from_session(&session))
}

fn validated(vertex: Vertex) -> Result<Vertex> {
    if vertex.is_valid() {
        Ok(vertex)
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid coordinate: {}, {}",
            vertex.latitude, vertex.longitude
        )))
    }
}

async fn add_vertex(
    State(state): State<Arc<AppState>>,
    Json(vertex): Json<Vertex>,
) -> Result<Json<PolygonResponse>> {
    let vertex = validated(vertex)?;
    let mut session = state.session.lock().await;
    session.add_vertex(vertex)?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

async fn drag_vertex(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(vertex): Json<Vertex>,
) -> Result<Json<PolygonResponse>> {
    let vertex = validated(vertex)?;
    let mut session = state.session.lock().await;
    session.drag_vertex(index, vertex)?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

async fn undo_vertex(State(state): State<Arc<AppState>>) -> Result<Json<PolygonResponse>> {
    let mut session = state.session.lock().await;
    session.undo_last_vertex()?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

async fn close_polygon(State(state): State<Arc<AppState>>) -> Result<Json<PolygonResponse>> {
    let mut session = state.session.lock().await;
    session.close_polygon()?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

async fn restart_polygon(State(state): State<Arc<AppState>>) -> Result<Json<PolygonResponse>> {
    let mut session = state.session.lock().await;
    session.restart_polygon()?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

#[derive(Deserialize)]
struct LoadPolygonRequest {
    vertices: Vec<serde_json::Value>,
}

/// Load a stored polygon. Unusable geometry leaves no polygon.
async fn load_polygon(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoadPolygonRequest>,
) -> Result<Json<PolygonResponse>> {
    let mut session = state.session.lock().await;
    session.load_polygon(&body.vertices)?;
    Ok(Json(PolygonResponse::from_session(&session)))
}

#[derive(Deserialize)]
struct ProtectionStatusRequest {
    status: Option<String>,
}

async fn set_protection_status(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProtectionStatusRequest>,
) -> Result<StatusCode> {
    let status = match body.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(ProtectionStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown protection status: {}", raw))
        })?),
    };
    state.session.lock().await.set_protection_status(status);
    Ok(StatusCode::NO_CONTENT)
}

/// Saved polygon plus place attributes for its centroid.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveResponse {
    pub snapshot: PolygonSnapshot,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub geojson: geojson::Feature,
    pub place: PlaceInfo,
}

/// Snapshot the closed polygon and look up its centroid.
///
/// A failed lookup does not fail the save; placeholders are returned.
async fn save_polygon(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>> {
    let snapshot = state.session.lock().await.save()?;

    // Lock released while the lookup is in flight.
    let (place, lookup_error) = state
        .place_lookup
        .lookup_or_unknown(snapshot.centroid_lat, snapshot.centroid_lng)
        .await;
    if let Some(e) = lookup_error {
        state.session.lock().await.report_lookup_failure(&e);
    }

    Ok(Json(SaveResponse {
        geojson: snapshot.to_geojson(),
        snapshot,
        place,
    }))
}

// ─── Location ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationResponse {
    /// True when the event went to the running feed
    pub forwarded: bool,
    pub position: Option<FilteredPosition>,
    pub locate: LocateStatus,
}

impl LocationResponse {
    fn from_session(session: &CaptureSession, forwarded: bool) -> Self {
        Self {
            forwarded,
            position: session.current_position(),
            locate: session.locate_status(),
        }
    }
}

/// Device sample from the browser's geolocation watch.
///
/// Goes through the location feed when one is running, otherwise
/// straight to the session.
async fn push_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<PositionSample>,
) -> Json<LocationResponse> {
    let forwarded = state.location.push_sample(sample);
    let mut session = state.session.lock().await;
    if !forwarded {
        session.ingest_sample(sample);
    }
    Json(LocationResponse::from_session(&session, forwarded))
}

#[derive(Deserialize)]
struct LocationErrorRequest {
    error: LocationError,
}

async fn push_location_error(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LocationErrorRequest>,
) -> Json<LocationResponse> {
    let forwarded = state.location.push_error(body.error);
    let mut session = state.session.lock().await;
    if !forwarded {
        session.location_failed(body.error);
    }
    Json(LocationResponse::from_session(&session, forwarded))
}

/// Start (or restart) the automatic location attempt.
async fn start_location(State(state): State<Arc<AppState>>) -> Json<LocationResponse> {
    let mut feed = state.feed.lock().await;
    if let Some(previous) = feed.take() {
        previous.stop();
    }
    *feed = Some(LocationFeed::start(
        &state.location,
        state.session.clone(),
        state.config.session.first_fix_timeout,
    ));
    tracing::info!("Location feed started");
    drop(feed);

    let session = state.session.lock().await;
    Json(LocationResponse::from_session(&session, false))
}

async fn stop_location(State(state): State<Arc<AppState>>) -> Json<LocationResponse> {
    if let Some(feed) = state.feed.lock().await.take() {
        feed.stop();
    }
    let mut session = state.session.lock().await;
    session.location_stopped();
    Json(LocationResponse::from_session(&session, false))
}

/// "Center on me".
async fn recenter(State(state): State<Arc<AppState>>) -> Result<Json<FilteredPosition>> {
    state
        .session
        .lock()
        .await
        .recenter()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No position fix yet".to_string()))
}

// ─── Parcels & Places ────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshParcelsResponse {
    pub drawable: usize,
}

/// Re-fetch overlay parcels. Query parameters replace the stored filter.
async fn refresh_parcels(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ParcelFilter>,
) -> Result<Json<RefreshParcelsResponse>> {
    if filter.exclude_id.is_some() || filter.municipality.is_some() {
        *state.parcel_filter.lock().await = filter;
    }
    let drawable = state.refresh_parcels().await?;
    Ok(Json(RefreshParcelsResponse { drawable }))
}

#[derive(Deserialize)]
struct PlaceQuery {
    lat: f64,
    lng: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaceResponse {
    pub place: PlaceInfo,
    /// True when placeholders stand in for a failed lookup
    pub degraded: bool,
}

/// Place attributes for a coordinate.
///
/// A lookup superseded by a newer one for the same coordinate is reported
/// as a conflict so the caller drops it.
async fn get_place(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaceQuery>,
) -> Result<Json<PlaceResponse>> {
    match state.place_lookup.lookup(query.lat, query.lng).await {
        Ok(place) => Ok(Json(PlaceResponse {
            place,
            degraded: false,
        })),
        Err(CaptureError::LookupSuperseded) => Err(CaptureError::LookupSuperseded.into()),
        Err(e) => {
            tracing::warn!(lat = query.lat, lng = query.lng, error = %e, "Place lookup failed");
            state.session.lock().await.report_lookup_failure(&e);
            Ok(Json(PlaceResponse {
                place: PlaceInfo::unknown(),
                degraded: true,
            }))
        }
    }
}

// ─── Events, Banner & Preferences ────────────────────────────

/// Drain host notifications queued since the last call.
async fn drain_events(State(state): State<Arc<AppState>>) -> Json<Vec<MapEvent>> {
    Json(state.session.lock().await.events_mut().drain())
}

async fn dismiss_banner(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().await.dismiss_banner();
    StatusCode::NO_CONTENT
}

async fn set_preferences(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<UserPreferences>,
) -> Json<UserPreferences> {
    let mut session = state.session.lock().await;
    session.set_preferences(preferences);
    Json(session.preferences().clone())
}

async fn dismiss_drawing_hint(State(state): State<Arc<AppState>>) -> Json<UserPreferences> {
    let mut session = state.session.lock().await;
    session.dismiss_drawing_hint();
    Json(session.preferences().clone())
}
