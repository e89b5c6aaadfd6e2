// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habitat polygon model: vertices, closure and derived measurements.

use crate::models::parcel::ProtectionStatus;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One corner point of a polygon boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Vertex {
    pub latitude: f64,
    pub longitude: f64,
}

impl Vertex {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the coordinates are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    fn key(&self) -> (u64, u64) {
        // Adding 0.0 folds -0.0 into 0.0
        (
            (self.latitude + 0.0).to_bits(),
            (self.longitude + 0.0).to_bits(),
        )
    }
}

impl From<Vertex> for Coord<f64> {
    fn from(v: Vertex) -> Self {
        Coord {
            x: v.longitude,
            y: v.latitude,
        }
    }
}

impl From<Coord<f64>> for Vertex {
    fn from(c: Coord<f64>) -> Self {
        Vertex::new(c.y, c.x)
    }
}

/// Ordered vertex sequence with an explicit closure flag.
///
/// When `closed` is set the last vertex repeats the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Polygon {
    pub vertices: Vec<Vertex>,
    pub closed: bool,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the first and last vertex coincide.
    pub fn ends_match(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => self.vertices.len() > 1 && first == last,
            _ => false,
        }
    }

    /// Vertices without the closing copy of the first one.
    pub fn ring(&self) -> &[Vertex] {
        if self.ends_match() {
            &self.vertices[..self.vertices.len() - 1]
        } else {
            &self.vertices
        }
    }

    /// Number of vertices with distinct coordinates.
    pub fn distinct_vertex_count(&self) -> usize {
        self.vertices
            .iter()
            .map(Vertex::key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Arithmetic mean of the ring's latitudes and longitudes.
    ///
    /// Not a spherical centroid; parcels are small enough for this to hold.
    pub fn centroid(&self) -> Option<Vertex> {
        let ring = self.ring();
        if ring.is_empty() {
            return None;
        }
        let n = ring.len() as f64;
        let lat = ring.iter().map(|v| v.latitude).sum::<f64>() / n;
        let lng = ring.iter().map(|v| v.longitude).sum::<f64>() / n;
        Some(Vertex::new(lat, lng))
    }

    /// Convert to a `geo` polygon (x = longitude, y = latitude).
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let coords: Vec<Coord<f64>> = self.ring().iter().copied().map(Coord::from).collect();
        geo::Polygon::new(LineString::from(coords), vec![])
    }
}

/// Ground area in whole square meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AreaMeasurement(#[cfg_attr(feature = "binding-generation", ts(type = "number"))] pub u64);

impl AreaMeasurement {
    pub const ZERO: AreaMeasurement = AreaMeasurement(0);

    pub fn square_meters(self) -> u64 {
        self.0
    }

    pub fn hectares(self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

/// What the host survey form receives on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PolygonSnapshot {
    pub vertices: Vec<Vertex>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub area_sq_meters: u64,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
    pub protection_status: Option<ProtectionStatus>,
    /// RFC3339 save time
    pub saved_at: String,
}

impl PolygonSnapshot {
    /// GeoJSON feature for the habitat-record service.
    pub fn to_geojson(&self) -> geojson::Feature {
        let polygon = Polygon::new(self.vertices.clone(), true).to_geo();
        let mut properties = geojson::JsonObject::new();
        properties.insert("area_sq_meters".to_string(), self.area_sq_meters.into());
        properties.insert("centroid_lat".to_string(), self.centroid_lat.into());
        properties.insert("centroid_lng".to_string(), self.centroid_lng.into());
        if let Some(status) = self.protection_status {
            properties.insert(
                "protection_status".to_string(),
                status.as_str().to_string().into(),
            );
        }
        properties.insert("saved_at".to_string(), self.saved_at.clone().into());

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(0.0, 2.0),
                Vertex::new(2.0, 2.0),
                Vertex::new(2.0, 0.0),
                Vertex::new(0.0, 0.0),
            ],
            true,
        )
    }

    #[test]
    fn test_ring_drops_closing_copy() {
        let polygon = square();
        assert_eq!(polygon.vertices.len(), 5);
        assert_eq!(polygon.ring().len(), 4);
        assert_eq!(polygon.distinct_vertex_count(), 4);
    }

    #[test]
    fn test_signed_zero_is_one_vertex() {
        let polygon = Polygon::new(
            vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(-0.0, -0.0),
                Vertex::new(0.0, 1.0),
                Vertex::new(1.0, -0.0),
            ],
            false,
        );
        assert_eq!(polygon.distinct_vertex_count(), 3);
    }

    #[test]
    fn test_centroid_is_mean_of_ring() {
        let centroid = square().centroid().unwrap();
        assert_eq!(centroid, Vertex::new(1.0, 1.0));
    }

    #[test]
    fn test_centroid_empty() {
        assert!(Polygon::default().centroid().is_none());
    }

    #[test]
    fn test_geo_axis_order() {
        let coord: Coord<f64> = Vertex::new(46.72, 11.65).into();
        assert_eq!(coord.x, 11.65);
        assert_eq!(coord.y, 46.72);
    }

    #[test]
    fn test_snapshot_geojson_properties() {
        let snapshot = PolygonSnapshot {
            vertices: square().vertices,
            area_sq_meters: 42,
            centroid_lat: 1.0,
            centroid_lng: 1.0,
            protection_status: Some(ProtectionStatus::LegallyProtected),
            saved_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let feature = snapshot.to_geojson();
        assert_eq!(
            feature.property("protection_status").and_then(|v| v.as_str()),
            Some("legally-protected")
        );
        assert_eq!(
            feature.property("area_sq_meters").and_then(|v| v.as_u64()),
            Some(42)
        );
        assert!(feature.geometry.is_some());
    }
}
