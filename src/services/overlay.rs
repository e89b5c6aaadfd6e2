// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overlay synchronization for already-surveyed parcels.
//!
//! The parcel list is replaced wholesale, never patched. Every refresh
//! removes all shapes this layer drew before drawing the new set, so
//! shapes cannot leak across refreshes or viewport changes.

use crate::models::{OverlayParcel, ParcelRecord, Polygon, Vertex};
use crate::services::normalizer::CoordinateNormalizer;
use crate::surface::{MapSurface, RenderedShape, ShapeStyle, Viewport};
use geo::{Intersects, Point};
use std::collections::HashSet;

/// A parcel with its geometry prepared for hit testing.
#[derive(Debug, Clone)]
struct PreparedParcel {
    parcel: OverlayParcel,
    geometry: geo::Polygon<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayLayer {
    normalizer: CoordinateNormalizer,
    parcels: Vec<PreparedParcel>,
    rendered: Vec<String>,
}

impl OverlayLayer {
    pub fn new(normalizer: CoordinateNormalizer) -> Self {
        Self {
            normalizer,
            parcels: Vec::new(),
            rendered: Vec::new(),
        }
    }

    /// Replace the parcel set. Returns how many parcels are drawable.
    ///
    /// Records without at least three usable points and repeated ids are
    /// skipped. Call [`OverlayLayer::sync`] afterwards to draw them.
    pub fn set_parcels(&mut self, records: &[ParcelRecord]) -> usize {
        let mut seen = HashSet::new();
        let mut parcels = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id.as_str()) {
                tracing::warn!(id = %record.id, "Skipping duplicate parcel id");
                continue;
            }
            let ring = match self.normalizer.normalize_ring(&record.polygon) {
                Ok(ring) => ring,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "Skipping parcel without usable geometry");
                    continue;
                }
            };
            let geometry = Polygon::new(ring.clone(), true).to_geo();
            parcels.push(PreparedParcel {
                parcel: OverlayParcel::from_record(record, ring),
                geometry,
            });
        }

        tracing::info!(
            received = records.len(),
            drawable = parcels.len(),
            "Overlay parcels replaced"
        );
        self.parcels = parcels;
        self.parcels.len()
    }

    pub fn parcels(&self) -> impl Iterator<Item = &OverlayParcel> {
        self.parcels.iter().map(|p| &p.parcel)
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&OverlayParcel> {
        self.parcels().find(|p| p.id == id)
    }

    /// Ids of the shapes currently drawn by this layer.
    pub fn rendered_ids(&self) -> &[String] {
        &self.rendered
    }

    /// Clear and rebuild all overlay shapes.
    ///
    /// `interactive` is false while a polygon is being drawn, so overlay
    /// shapes do not swallow vertex clicks.
    pub fn sync<S: MapSurface + ?Sized>(&mut self, surface: &mut S, interactive: bool) {
        self.clear(surface);
        for prepared in &self.parcels {
            let parcel = &prepared.parcel;
            surface.add_shape(RenderedShape {
                id: parcel.id.clone(),
                label: parcel.name.clone(),
                ring: parcel.polygon.clone(),
                style: ShapeStyle {
                    fill_color: parcel.color_category.hex().to_string(),
                    fill_opacity: parcel.opacity,
                    stroke_color: parcel.color_category.hex().to_string(),
                },
                interactive,
            });
            self.rendered.push(parcel.id.clone());
        }
    }

    /// Re-apply renderings after a pan or zoom.
    pub fn on_viewport_change<S: MapSurface + ?Sized>(
        &mut self,
        viewport: Viewport,
        surface: &mut S,
        interactive: bool,
    ) {
        tracing::trace!(zoom = viewport.zoom, "Re-rendering overlays after viewport change");
        self.sync(surface, interactive);
    }

    /// Remove every shape this layer has drawn.
    pub fn clear<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        for id in self.rendered.drain(..) {
            surface.remove_shape(&id);
        }
    }

    /// Resolve a map click to the topmost parcel containing it.
    pub fn hit_test(&self, point: Vertex) -> Option<&str> {
        let point = Point::new(point.longitude, point.latitude);
        self.parcels
            .iter()
            .rev()
            .find(|p| p.geometry.intersects(&point))
            .map(|p| p.parcel.id.as_str())
    }
}

/// Orders shape clicks ahead of the generic background click.
///
/// Map libraries usually deliver both events for a click on a shape; the
/// background click that trails a shape click must not clear the
/// selection the shape click just made.
#[derive(Debug, Clone)]
pub struct ClickArbiter {
    dedupe_ms: i64,
    last_shape_click_ms: Option<i64>,
}

impl ClickArbiter {
    pub fn new(dedupe_ms: i64) -> Self {
        Self {
            dedupe_ms,
            last_shape_click_ms: None,
        }
    }

    pub fn shape_clicked(&mut self, at_ms: i64) {
        self.last_shape_click_ms = Some(at_ms);
    }

    /// Whether a background click should be handled.
    pub fn accept_background_click(&mut self, at_ms: i64) -> bool {
        match self.last_shape_click_ms {
            Some(shape_ms) if (at_ms - shape_ms).abs() <= self.dedupe_ms => {
                // One shape click swallows at most one background click.
                self.last_shape_click_ms = None;
                false
            }
            _ => true,
        }
    }
}
