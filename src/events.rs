// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notifications from the engine to the host survey form.

use crate::models::{AreaMeasurement, Vertex};
use serde::Serialize;
use std::collections::VecDeque;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Host callbacks. All methods default to no-ops.
pub trait MapEvents {
    fn on_polygon_change(&mut self, _vertices: &[Vertex]) {}
    fn on_area_change(&mut self, _area: AreaMeasurement) {}
    fn on_center_change(&mut self, _latitude: f64, _longitude: f64) {}
    fn on_zoom_change(&mut self, _zoom: f64) {}
    fn on_parcel_selected(&mut self, _id: &str) {}
    fn on_map_background_click(&mut self) {}
}

/// A recorded host notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MapEvent {
    PolygonChange {
        vertices: Vec<Vertex>,
    },
    AreaChange {
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        area_sq_meters: u64,
    },
    CenterChange {
        latitude: f64,
        longitude: f64,
    },
    ZoomChange {
        zoom: f64,
    },
    ParcelSelected {
        id: String,
    },
    MapBackgroundClick,
}

/// Bounded queue of events, drained by the frontend.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<MapEvent>,
    capacity: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, event: MapEvent) {
        if self.events.len() == self.capacity {
            // Oldest event is dropped; the frontend resyncs from the map view.
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<MapEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl MapEvents for EventQueue {
    fn on_polygon_change(&mut self, vertices: &[Vertex]) {
        self.push(MapEvent::PolygonChange {
            vertices: vertices.to_vec(),
        });
    }

    fn on_area_change(&mut self, area: AreaMeasurement) {
        self.push(MapEvent::AreaChange {
            area_sq_meters: area.square_meters(),
        });
    }

    fn on_center_change(&mut self, latitude: f64, longitude: f64) {
        self.push(MapEvent::CenterChange {
            latitude,
            longitude,
        });
    }

    fn on_zoom_change(&mut self, zoom: f64) {
        self.push(MapEvent::ZoomChange { zoom });
    }

    fn on_parcel_selected(&mut self, id: &str) {
        self.push(MapEvent::ParcelSelected { id: id.to_string() });
    }

    fn on_map_background_click(&mut self) {
        self.push(MapEvent::MapBackgroundClick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let mut queue = EventQueue::with_capacity(2);
        queue.on_zoom_change(1.0);
        queue.on_zoom_change(2.0);
        queue.on_zoom_change(3.0);

        let events = queue.drain();
        assert_eq!(
            events,
            vec![
                MapEvent::ZoomChange { zoom: 2.0 },
                MapEvent::ZoomChange { zoom: 3.0 }
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(MapEvent::ParcelSelected {
            id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "parcel_selected");
        assert_eq!(json["id"], "abc");
    }
}
