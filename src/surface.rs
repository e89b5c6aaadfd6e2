// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rendering seam between the engine and whatever draws the map.
//!
//! The engine only ever talks to [`MapSurface`]. [`SurfaceState`] is the
//! implementation used by the HTTP layer: it records the desired render
//! state, which the web frontend applies to its map library.

use crate::models::{CursorStyle, FilteredPosition, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Visible map window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Viewport {
    pub center: Vertex,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Vertex::new(0.0, 0.0),
            zoom: 2.0,
        }
    }
}

/// Fill and stroke for a drawn polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShapeStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
}

/// One overlay shape on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RenderedShape {
    /// Parcel id the shape resolves to when clicked
    pub id: String,
    pub label: String,
    pub ring: Vec<Vertex>,
    pub style: ShapeStyle,
    pub interactive: bool,
}

/// The polygon being captured, drawn separately from overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DraftShape {
    pub vertices: Vec<Vertex>,
    pub closed: bool,
    pub fill_color: String,
}

/// Operations the engine needs from a map renderer.
pub trait MapSurface {
    /// Enable or disable camera pan, zoom and rotation.
    fn set_navigation_enabled(&mut self, enabled: bool);
    fn set_cursor(&mut self, cursor: CursorStyle);
    /// Show or hide the drag handles on the draft polygon's vertices.
    fn set_vertex_handles(&mut self, enabled: bool);
    fn set_marker(&mut self, position: FilteredPosition);
    fn fly_to(&mut self, center: Vertex, zoom: f64);
    fn add_shape(&mut self, shape: RenderedShape);
    fn remove_shape(&mut self, id: &str);
    fn draw_draft(&mut self, draft: DraftShape);
}

/// Recorded render state, serialized to the web frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SurfaceState {
    pub navigation_enabled: bool,
    pub cursor: CursorStyle,
    pub vertex_handles: bool,
    pub marker: Option<FilteredPosition>,
    /// Last camera move requested by the engine
    pub camera: Option<Viewport>,
    pub shapes: BTreeMap<String, RenderedShape>,
    pub draft: DraftShape,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            navigation_enabled: true,
            cursor: CursorStyle::Grab,
            vertex_handles: false,
            marker: None,
            camera: None,
            shapes: BTreeMap::new(),
            draft: DraftShape::default(),
        }
    }
}

impl MapSurface for SurfaceState {
    fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }

    fn set_vertex_handles(&mut self, enabled: bool) {
        self.vertex_handles = enabled;
    }

    fn set_marker(&mut self, position: FilteredPosition) {
        self.marker = Some(position);
    }

    fn fly_to(&mut self, center: Vertex, zoom: f64) {
        self.camera = Some(Viewport { center, zoom });
    }

    fn add_shape(&mut self, shape: RenderedShape) {
        self.shapes.insert(shape.id.clone(), shape);
    }

    fn remove_shape(&mut self, id: &str) {
        self.shapes.remove(id);
    }

    fn draw_draft(&mut self, draft: DraftShape) {
        self.draft = draft;
    }
}
