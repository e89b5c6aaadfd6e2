// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The capture session: one map widget instance.
//!
//! Ties the position filter, mode controller, capture engine and overlay
//! layer to a map surface and to the host's event callbacks. The session
//! is the only writer of its state; the mode decides which component may
//! mutate what.

use crate::config::Config;
use crate::error::{CaptureError, LocationError};
use crate::events::{EventQueue, MapEvents};
use crate::models::{
    AreaMeasurement, ColorCategory, FilterStats, FilteredPosition, MapMode, ParcelRecord,
    PolygonSnapshot, PositionSample, ProtectionStatus, UserPreferences, Vertex,
};
use crate::services::capture::{CaptureEngine, MIN_POLYGON_VERTICES};
use crate::services::mode::{ModeController, ModeTransition};
use crate::services::normalizer::CoordinateNormalizer;
use crate::services::overlay::{ClickArbiter, OverlayLayer};
use crate::services::position_filter::PositionFilter;
use crate::services::tracker::LocationSink;
use crate::surface::{DraftShape, MapSurface, SurfaceState, Viewport};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// State of the automatic location attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LocateStatus {
    /// No location feed running
    #[default]
    Off,
    /// Subscribed, waiting for the first fix
    Waiting,
    Tracking,
    /// Attempt ended; vertices are placed by hand
    Failed { error: LocationError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum BannerKind {
    Info,
    Warning,
}

/// Transient, dismissible message. Never blocks the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Banner {
    pub kind: BannerKind,
    pub code: String,
    pub message: String,
}

impl Banner {
    fn from_error(kind: BannerKind, error: &CaptureError) -> Self {
        Self {
            kind,
            code: error.code().to_string(),
            message: error.user_message(),
        }
    }
}

/// What a click on the map did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ClickOutcome {
    VertexAdded {
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        area_sq_meters: u64,
    },
    PolygonClosed {
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        area_sq_meters: u64,
    },
    ParcelSelected {
        id: String,
    },
    Background,
    /// Swallowed: trailing background click, closed polygon, or unknown parcel
    Ignored,
}

pub struct CaptureSession<S = SurfaceState, E = EventQueue> {
    locate_zoom: f64,
    filter: PositionFilter,
    normalizer: CoordinateNormalizer,
    controller: ModeController,
    engine: CaptureEngine,
    overlay: OverlayLayer,
    clicks: ClickArbiter,
    surface: S,
    events: E,
    preferences: UserPreferences,
    protection_status: Option<ProtectionStatus>,
    viewport: Viewport,
    locate: LocateStatus,
    centered: bool,
    selected_parcel: Option<String>,
    banner: Option<Banner>,
}

impl CaptureSession {
    /// Session rendering into a recorded [`SurfaceState`] with queued events.
    pub fn headless(config: &Config, preferences: UserPreferences) -> Self {
        Self::new(config, SurfaceState::default(), EventQueue::default(), preferences)
    }
}

impl<S: MapSurface, E: MapEvents> CaptureSession<S, E> {
    pub fn new(config: &Config, surface: S, events: E, preferences: UserPreferences) -> Self {
        let normalizer = CoordinateNormalizer::new(config.session.axis_swap_threshold);
        let mut session = Self {
            locate_zoom: config.session.locate_zoom,
            filter: PositionFilter::new(config.filter.clone()),
            overlay: OverlayLayer::new(normalizer.clone()),
            normalizer,
            controller: ModeController::new(),
            engine: CaptureEngine::new(),
            clicks: ClickArbiter::new(config.session.click_dedupe_ms),
            surface,
            events,
            preferences,
            protection_status: None,
            viewport: Viewport::default(),
            locate: LocateStatus::Off,
            centered: false,
            selected_parcel: None,
            banner: None,
        };
        session.surface.set_navigation_enabled(true);
        session.surface.set_cursor(MapMode::Navigation.cursor());
        session
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn mode(&self) -> MapMode {
        self.controller.mode()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn area(&self) -> AreaMeasurement {
        self.engine.area()
    }

    pub fn current_position(&self) -> Option<FilteredPosition> {
        self.filter.current()
    }

    pub fn filter_stats(&self) -> FilterStats {
        self.filter.stats()
    }

    pub fn locate_status(&self) -> LocateStatus {
        self.locate
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn selected_parcel(&self) -> Option<&str> {
        self.selected_parcel.as_deref()
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn protection_status(&self) -> Option<ProtectionStatus> {
        self.protection_status
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // ─── Location ────────────────────────────────────────────────

    /// A location subscription went live.
    pub fn location_waiting(&mut self) {
        self.filter.reset();
        self.locate = LocateStatus::Waiting;
    }

    /// Feed one device sample through the filter.
    ///
    /// Centers the map on the first applied position of the session only.
    pub fn ingest_sample(&mut self, sample: PositionSample) -> Option<FilteredPosition> {
        let position = self.filter.ingest(sample)?;
        self.locate = LocateStatus::Tracking;
        self.surface.set_marker(position);

        if !self.centered {
            self.centered = true;
            tracing::info!(
                latitude = position.latitude,
                longitude = position.longitude,
                "First location fix; centering map"
            );
            self.center_on(position);
        }
        Some(position)
    }

    /// The automatic location attempt ended. Manual placement continues.
    pub fn location_failed(&mut self, error: LocationError) {
        tracing::warn!(error = %error, "Falling back to manual placement");
        self.locate = LocateStatus::Failed { error };
        self.banner = Some(Banner::from_error(
            BannerKind::Warning,
            &CaptureError::from(error),
        ));
    }

    /// The feed was stopped by the host. The last position stays shown.
    pub fn location_stopped(&mut self) {
        if !matches!(self.locate, LocateStatus::Failed { .. }) {
            self.locate = LocateStatus::Off;
        }
    }

    /// Explicit "center on me".
    pub fn recenter(&mut self) -> Option<FilteredPosition> {
        let position = self.filter.current()?;
        self.center_on(position);
        Some(position)
    }

    fn center_on(&mut self, position: FilteredPosition) {
        let center = Vertex::new(position.latitude, position.longitude);
        self.surface.fly_to(center, self.locate_zoom);
        self.viewport = Viewport {
            center,
            zoom: self.locate_zoom,
        };
        self.events
            .on_center_change(position.latitude, position.longitude);
        self.events.on_zoom_change(self.locate_zoom);
    }

    // ─── Modes ───────────────────────────────────────────────────

    /// Press the Navigation or PolygonEditing toggle.
    pub fn toggle_mode(&mut self, target: MapMode) -> Result<ModeTransition, CaptureError> {
        let polygon_closed = self.engine.is_closed();
        let transition = self
            .controller
            .toggle(target, &mut self.surface, polygon_closed)?;
        self.after_transition(transition);
        Ok(transition)
    }

    fn after_transition(&mut self, transition: ModeTransition) {
        if transition.to == MapMode::PolygonEditing && transition.from != MapMode::PolygonEditing
        {
            self.selected_parcel = None;
            self.overlay.sync(&mut self.surface, false);
        } else if transition.left_editing() {
            self.overlay.sync(&mut self.surface, true);
        }
    }

    // ─── Clicks ──────────────────────────────────────────────────

    /// A click on the map at `point`.
    ///
    /// While editing, clicks place vertices; clicking the first vertex of a
    /// ring with three or more points closes it. Otherwise overlay shapes
    /// are hit-tested before the click counts as a background click.
    pub fn map_click(&mut self, point: Vertex, at_ms: i64) -> Result<ClickOutcome, CaptureError> {
        if self.controller.is_editing() {
            if self.engine.is_closed() {
                return Ok(ClickOutcome::Ignored);
            }
            let polygon = self.engine.polygon();
            let closes_ring = polygon.vertices.first() == Some(&point)
                && polygon.distinct_vertex_count() >= MIN_POLYGON_VERTICES;
            if closes_ring {
                let area = self.close_polygon()?;
                return Ok(ClickOutcome::PolygonClosed {
                    area_sq_meters: area.square_meters(),
                });
            }
            let area = self.add_vertex(point)?;
            return Ok(ClickOutcome::VertexAdded {
                area_sq_meters: area.square_meters(),
            });
        }

        if let Some(id) = self.overlay.hit_test(point).map(str::to_string) {
            self.select_parcel(id.clone(), at_ms);
            return Ok(ClickOutcome::ParcelSelected { id });
        }

        if !self.clicks.accept_background_click(at_ms) {
            tracing::debug!(at_ms, "Background click swallowed after shape click");
            return Ok(ClickOutcome::Ignored);
        }
        self.background_click();
        Ok(ClickOutcome::Background)
    }

    /// A click delivered by an overlay shape itself.
    pub fn parcel_click(&mut self, id: &str, at_ms: i64) -> ClickOutcome {
        if self.controller.is_editing() || self.overlay.get(id).is_none() {
            return ClickOutcome::Ignored;
        }
        self.select_parcel(id.to_string(), at_ms);
        ClickOutcome::ParcelSelected { id: id.to_string() }
    }

    fn select_parcel(&mut self, id: String, at_ms: i64) {
        self.clicks.shape_clicked(at_ms);
        if self.controller.mode() != MapMode::Idle {
            let transition = self.controller.force_idle(&mut self.surface);
            self.after_transition(transition);
        }
        tracing::debug!(id = %id, "Parcel selected");
        self.events.on_parcel_selected(&id);
        self.selected_parcel = Some(id);
    }

    fn background_click(&mut self) {
        if self.selected_parcel.take().is_some() {
            tracing::debug!("Parcel selection cleared");
        }
        self.events.on_map_background_click();
    }

    // ─── Polygon ─────────────────────────────────────────────────

    fn require_editing(&self) -> Result<(), CaptureError> {
        if self.controller.is_editing() {
            Ok(())
        } else {
            Err(CaptureError::NotEditing)
        }
    }

    pub fn add_vertex(&mut self, point: Vertex) -> Result<AreaMeasurement, CaptureError> {
        self.require_editing()?;
        let area = self.engine.add_vertex(point)?;
        self.polygon_changed();
        Ok(area)
    }

    /// Close the ring and switch to inspection.
    pub fn close_polygon(&mut self) -> Result<AreaMeasurement, CaptureError> {
        self.require_editing()?;
        let area = match self.engine.close_polygon() {
            Ok(area) => area,
            Err(e) => {
                self.banner = Some(Banner::from_error(BannerKind::Info, &e));
                return Err(e);
            }
        };
        self.polygon_changed();
        let transition = self.controller.force_idle(&mut self.surface);
        self.after_transition(transition);
        Ok(area)
    }

    pub fn drag_vertex(
        &mut self,
        index: usize,
        point: Vertex,
    ) -> Result<AreaMeasurement, CaptureError> {
        self.require_editing()?;
        let area = self.engine.drag_vertex(index, point)?;
        self.polygon_changed();
        Ok(area)
    }

    pub fn undo_last_vertex(&mut self) -> Result<Option<Vertex>, CaptureError> {
        self.require_editing()?;
        let removed = self.engine.remove_last_vertex();
        if removed.is_some() {
            self.surface.set_vertex_handles(false);
            self.polygon_changed();
        }
        Ok(removed)
    }

    /// Discard the polygon. Overlays are untouched.
    pub fn restart_polygon(&mut self) -> Result<(), CaptureError> {
        self.require_editing()?;
        self.engine.restart();
        self.surface.set_vertex_handles(false);
        self.polygon_changed();
        Ok(())
    }

    /// Live vertex list, in any mode.
    pub fn extract_points(&self) -> Vec<Vertex> {
        self.engine.extract_current_points()
    }

    /// Snapshot the polygon for the host record.
    pub fn save(&mut self) -> Result<PolygonSnapshot, CaptureError> {
        match self.engine.snapshot(self.protection_status) {
            Ok(snapshot) => {
                tracing::info!(
                    vertices = snapshot.vertices.len(),
                    area_sq_meters = snapshot.area_sq_meters,
                    "Polygon saved"
                );
                Ok(snapshot)
            }
            Err(e) => {
                self.banner = Some(Banner::from_error(BannerKind::Info, &e));
                Err(e)
            }
        }
    }

    /// Replace the polygon with one loaded from the host's record.
    ///
    /// Unrecoverable points are dropped; with fewer than three usable points
    /// left the polygon is treated as absent.
    pub fn load_polygon(
        &mut self,
        raw: &[serde_json::Value],
    ) -> Result<AreaMeasurement, CaptureError> {
        match self.normalizer.normalize_ring(raw) {
            Ok(ring) => {
                let area = self.engine.replace(ring, true);
                self.polygon_changed();
                tracing::info!(area_sq_meters = area.square_meters(), "Stored polygon loaded");
                Ok(area)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored polygon treated as absent");
                self.engine.restart();
                self.polygon_changed();
                self.banner = Some(Banner::from_error(BannerKind::Warning, &e));
                Err(e)
            }
        }
    }

    /// Protection status chosen in the host form; colors the draft.
    pub fn set_protection_status(&mut self, status: Option<ProtectionStatus>) {
        self.protection_status = status;
        self.redraw_draft();
    }

    fn polygon_changed(&mut self) {
        let vertices = self.engine.extract_current_points();
        self.events.on_polygon_change(&vertices);
        self.events.on_area_change(self.engine.area());
        self.redraw_draft();
    }

    fn redraw_draft(&mut self) {
        self.surface.draw_draft(DraftShape {
            vertices: self.engine.extract_current_points(),
            closed: self.engine.is_closed(),
            fill_color: ColorCategory::from(self.protection_status).hex().to_string(),
        });
    }

    // ─── Overlays ────────────────────────────────────────────────

    /// Replace the overlay parcels wholesale and redraw them.
    pub fn set_parcels(&mut self, records: &[ParcelRecord]) -> usize {
        let drawable = self.overlay.set_parcels(records);
        if let Some(selected) = &self.selected_parcel {
            if self.overlay.get(selected).is_none() {
                self.selected_parcel = None;
            }
        }
        let interactive = !self.controller.is_editing();
        self.overlay.sync(&mut self.surface, interactive);
        drawable
    }

    /// Keep existing overlays and tell the user.
    pub fn parcel_fetch_failed(&mut self, error: &CaptureError) {
        tracing::warn!(error = %error, kept = self.overlay.len(), "Keeping existing overlays");
        self.banner = Some(Banner::from_error(BannerKind::Warning, error));
    }

    pub fn report_lookup_failure(&mut self, error: &CaptureError) {
        if *error == CaptureError::LookupSuperseded {
            return;
        }
        self.banner = Some(Banner::from_error(BannerKind::Warning, error));
    }

    /// The map was panned or zoomed.
    pub fn viewport_changed(&mut self, viewport: Viewport) {
        let previous = self.viewport;
        self.viewport = viewport;
        if previous.center != viewport.center {
            self.events
                .on_center_change(viewport.center.latitude, viewport.center.longitude);
        }
        if previous.zoom != viewport.zoom {
            self.events.on_zoom_change(viewport.zoom);
        }
        let interactive = !self.controller.is_editing();
        self.overlay
            .on_viewport_change(viewport, &mut self.surface, interactive);
    }

    // ─── Banner & preferences ────────────────────────────────────

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn set_preferences(&mut self, preferences: UserPreferences) {
        self.preferences = preferences;
    }

    /// "Don't show this hint again".
    pub fn dismiss_drawing_hint(&mut self) {
        self.preferences.show_drawing_hint = false;
    }

    /// Whether the drawing hint should be shown right now.
    pub fn drawing_hint_visible(&self) -> bool {
        self.preferences.show_drawing_hint
            && self.controller.is_editing()
            && !self.engine.is_closed()
    }
}

impl<S, E> LocationSink for CaptureSession<S, E>
where
    S: MapSurface + Send + 'static,
    E: MapEvents + Send + 'static,
{
    fn on_waiting(&mut self) {
        self.location_waiting();
    }

    fn on_sample(&mut self, sample: PositionSample) {
        self.ingest_sample(sample);
    }

    fn on_failure(&mut self, error: LocationError) {
        self.location_failed(error);
    }
}
