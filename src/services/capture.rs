// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polygon capture and editing engine.
//!
//! Owns the one in-progress habitat polygon for the lifetime of an editing
//! session. The area is recomputed synchronously after every mutation, so
//! it always reflects the latest vertex list.

use crate::error::CaptureError;
use crate::models::{AreaMeasurement, Polygon, PolygonSnapshot, ProtectionStatus, Vertex};
use crate::time_utils::format_utc_rfc3339;
use geo::GeodesicArea;

/// Minimum distinct vertices for a closeable polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Geodesic ground area of a polygon, rounded to whole square meters.
///
/// Open polygons are measured as if closed. Fewer than three distinct
/// vertices measure zero.
pub fn geodesic_area(polygon: &Polygon) -> AreaMeasurement {
    if polygon.distinct_vertex_count() < MIN_POLYGON_VERTICES {
        return AreaMeasurement::ZERO;
    }
    let area = polygon.to_geo().geodesic_area_unsigned();
    if !area.is_finite() || area <= 0.0 {
        return AreaMeasurement::ZERO;
    }
    AreaMeasurement(area.round() as u64)
}

#[derive(Debug, Clone, Default)]
pub struct CaptureEngine {
    polygon: Polygon,
    area: AreaMeasurement,
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn area(&self) -> AreaMeasurement {
        self.area
    }

    pub fn is_closed(&self) -> bool {
        self.polygon.closed
    }

    pub fn is_empty(&self) -> bool {
        self.polygon.is_empty()
    }

    /// Live vertex list, including mid-capture.
    pub fn extract_current_points(&self) -> Vec<Vertex> {
        self.polygon.vertices.clone()
    }

    /// Append a vertex during initial capture.
    ///
    /// Consecutive duplicates are accepted.
    pub fn add_vertex(&mut self, point: Vertex) -> Result<AreaMeasurement, CaptureError> {
        if self.polygon.closed {
            return Err(CaptureError::PolygonClosed);
        }
        self.polygon.vertices.push(point);
        tracing::debug!(
            count = self.polygon.vertices.len(),
            latitude = point.latitude,
            longitude = point.longitude,
            "Vertex added"
        );
        Ok(self.recompute())
    }

    /// Close the ring. Closing an already-closed polygon is a no-op.
    pub fn close_polygon(&mut self) -> Result<AreaMeasurement, CaptureError> {
        let count = self.polygon.distinct_vertex_count();
        if count < MIN_POLYGON_VERTICES {
            tracing::info!(count, "Polygon closure rejected: insufficient points");
            return Err(CaptureError::InsufficientVertices { count });
        }
        if !self.polygon.ends_match() {
            let first = self.polygon.vertices[0];
            self.polygon.vertices.push(first);
        }
        self.polygon.closed = true;
        let area = self.recompute();
        tracing::info!(
            vertices = self.polygon.ring().len(),
            area_sq_meters = area.square_meters(),
            "Polygon closed"
        );
        Ok(area)
    }

    /// Move an existing vertex of a closed polygon.
    ///
    /// The first and the closing vertex move together.
    pub fn drag_vertex(
        &mut self,
        index: usize,
        point: Vertex,
    ) -> Result<AreaMeasurement, CaptureError> {
        if !self.polygon.closed {
            return Err(CaptureError::PolygonNotClosed);
        }
        let len = self.polygon.vertices.len();
        if index >= len {
            return Err(CaptureError::VertexOutOfRange { index, len });
        }

        let last = len - 1;
        if index == 0 || index == last {
            self.polygon.vertices[0] = point;
            self.polygon.vertices[last] = point;
        } else {
            self.polygon.vertices[index] = point;
        }
        Ok(self.recompute())
    }

    /// Undo the last placement. Undoing on a closed polygon reopens it.
    pub fn remove_last_vertex(&mut self) -> Option<Vertex> {
        let removed = self.polygon.vertices.pop();
        if self.polygon.closed {
            self.polygon.closed = false;
            tracing::debug!("Polygon reopened by undo");
        }
        self.recompute();
        removed
    }

    /// Discard all vertices.
    pub fn restart(&mut self) {
        self.polygon = Polygon::default();
        self.area = AreaMeasurement::ZERO;
        tracing::debug!("Polygon capture restarted");
    }

    /// Replace the polygon wholesale, e.g. with a previously saved one.
    pub fn replace(&mut self, vertices: Vec<Vertex>, closed: bool) -> AreaMeasurement {
        let mut polygon = Polygon::new(vertices, false);
        if closed && polygon.distinct_vertex_count() >= MIN_POLYGON_VERTICES {
            if !polygon.ends_match() {
                let first = polygon.vertices[0];
                polygon.vertices.push(first);
            }
            polygon.closed = true;
        }
        self.polygon = polygon;
        self.recompute()
    }

    /// Snapshot for the host form. Never closes the polygon implicitly.
    pub fn snapshot(
        &self,
        protection_status: Option<ProtectionStatus>,
    ) -> Result<PolygonSnapshot, CaptureError> {
        let count = self.polygon.distinct_vertex_count();
        if count < MIN_POLYGON_VERTICES {
            return Err(CaptureError::InsufficientVertices { count });
        }
        if !self.polygon.closed {
            return Err(CaptureError::UnclosedPolygon);
        }
        let centroid = self
            .polygon
            .centroid()
            .ok_or(CaptureError::InsufficientVertices { count })?;

        Ok(PolygonSnapshot {
            vertices: self.polygon.vertices.clone(),
            area_sq_meters: self.area.square_meters(),
            centroid_lat: centroid.latitude,
            centroid_lng: centroid.longitude,
            protection_status,
            saved_at: format_utc_rfc3339(chrono::Utc::now()),
        })
    }

    fn recompute(&mut self) -> AreaMeasurement {
        self.area = geodesic_area(&self.polygon);
        self.area
    }
}
