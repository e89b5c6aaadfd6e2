// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polygon capture: closure, area and snapshots.

use habitat_capture::error::CaptureError;
use habitat_capture::models::{Polygon, ProtectionStatus, Vertex};
use habitat_capture::services::capture::{geodesic_area, CaptureEngine};

fn engine_with(points: &[(f64, f64)]) -> CaptureEngine {
    let mut engine = CaptureEngine::new();
    for &(lat, lng) in points {
        engine.add_vertex(Vertex::new(lat, lng)).unwrap();
    }
    engine
}

#[test]
fn test_two_vertices_cannot_close() {
    let mut engine = engine_with(&[(46.72, 11.65), (46.73, 11.66)]);
    assert_eq!(
        engine.close_polygon(),
        Err(CaptureError::InsufficientVertices { count: 2 })
    );
    assert!(!engine.is_closed());
    assert_eq!(engine.area().square_meters(), 0);
}

#[test]
fn test_repeated_points_do_not_count() {
    let mut engine = engine_with(&[(1.0, 1.0), (1.0, 1.0), (1.0, 2.0), (1.0, 2.0)]);
    assert!(matches!(
        engine.close_polygon(),
        Err(CaptureError::InsufficientVertices { count: 2 })
    ));
}

#[test]
fn test_closed_ring_first_equals_last() {
    let mut engine = engine_with(&[(46.72, 11.65), (46.72, 11.66), (46.73, 11.66)]);
    let area = engine.close_polygon().unwrap();
    assert!(area.square_meters() > 0);

    let points = engine.extract_current_points();
    assert_eq!(points.len(), 4);
    assert_eq!(points.first(), points.last());

    // Closing again changes nothing
    assert_eq!(engine.close_polygon().unwrap(), area);
    assert_eq!(engine.extract_current_points().len(), 4);
}

#[test]
fn test_dragging_first_vertex_keeps_ring_closed() {
    let mut engine = engine_with(&[(46.72, 11.65), (46.72, 11.66), (46.73, 11.66)]);
    engine.close_polygon().unwrap();
    let before = engine.area();

    let after = engine.drag_vertex(0, Vertex::new(46.715, 11.645)).unwrap();
    let points = engine.extract_current_points();
    assert_eq!(points[0], Vertex::new(46.715, 11.645));
    assert_eq!(points.first(), points.last());
    assert!(after > before);
}

#[test]
fn test_drag_out_of_range() {
    let mut engine = engine_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    engine.close_polygon().unwrap();
    assert_eq!(
        engine.drag_vertex(9, Vertex::new(0.5, 0.5)),
        Err(CaptureError::VertexOutOfRange { index: 9, len: 4 })
    );
}

#[test]
fn test_area_is_deterministic() {
    let polygon = Polygon::new(
        vec![
            Vertex::new(46.7200, 11.6500),
            Vertex::new(46.7200, 11.6600),
            Vertex::new(46.7280, 11.6620),
            Vertex::new(46.7300, 11.6500),
        ],
        true,
    );
    let first = geodesic_area(&polygon);
    for _ in 0..10 {
        assert_eq!(geodesic_area(&polygon), first);
    }
}

#[test]
fn test_large_polygon_area() {
    // 10° x 10° near the equator, roughly 1.23e12 m²
    let mut engine = engine_with(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
    let area = engine.close_polygon().unwrap();
    let m2 = area.square_meters() as f64;
    assert!(m2 > 1.1e12 && m2 < 1.3e12, "area {}", m2);
}

#[test]
fn test_area_independent_of_winding() {
    let clockwise = engine_with(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).area();
    let counter = engine_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).area();
    assert_eq!(clockwise, counter);
    assert!(clockwise.square_meters() > 0);
}

#[test]
fn test_snapshot_requires_closure() {
    let mut engine = engine_with(&[(46.72, 11.65), (46.72, 11.66), (46.73, 11.66)]);
    assert_eq!(engine.snapshot(None), Err(CaptureError::UnclosedPolygon));

    engine.close_polygon().unwrap();
    let snapshot = engine
        .snapshot(Some(ProtectionStatus::LegallyProtected))
        .unwrap();
    assert_eq!(snapshot.area_sq_meters, engine.area().square_meters());
    assert!((snapshot.centroid_lat - (46.72 + 46.72 + 46.73) / 3.0).abs() < 1e-9);
    assert!(snapshot.saved_at.ends_with('Z'));

    let feature = snapshot.to_geojson();
    let json = serde_json::to_value(&feature).unwrap();
    assert_eq!(json["geometry"]["type"], "Polygon");
    // GeoJSON positions are [lng, lat]
    assert_eq!(json["geometry"]["coordinates"][0][0][0], 11.65);
    assert_eq!(json["properties"]["protection_status"], "legally-protected");
}

#[test]
fn test_undo_and_restart() {
    let mut engine = engine_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    engine.close_polygon().unwrap();

    // Undo on a closed ring removes the closing vertex and reopens it
    assert_eq!(engine.remove_last_vertex(), Some(Vertex::new(0.0, 0.0)));
    assert!(!engine.is_closed());
    assert!(engine.add_vertex(Vertex::new(1.0, 0.0)).is_ok());

    engine.restart();
    assert!(engine.is_empty());
    assert_eq!(engine.area().square_meters(), 0);
    assert_eq!(engine.remove_last_vertex(), None);
}
