// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate normalizer for stored polygon data.
//!
//! Stored parcels come from several generations of the habitat-record
//! service: `[lat, lng]` pairs, `[lng, lat]` pairs, `{lat, lng}` and
//! `{latitude, longitude}` objects, with or without a closing point.
//! This is the only place those shapes are reconciled; live user input
//! never passes through here.

use crate::error::CaptureError;
use crate::models::Vertex;
use serde_json::Value;

/// Minimum number of usable points for a ring.
pub const MIN_RING_POINTS: usize = 3;

#[derive(Debug, Clone)]
pub struct CoordinateNormalizer {
    swap_threshold: f64,
}

impl Default for CoordinateNormalizer {
    fn default() -> Self {
        Self::new(90.0)
    }
}

impl CoordinateNormalizer {
    /// `swap_threshold`: a first component whose magnitude exceeds this is
    /// assumed to be a longitude.
    pub fn new(swap_threshold: f64) -> Self {
        Self { swap_threshold }
    }

    /// Interpret one stored point, or `None` if it cannot be recovered.
    pub fn normalize(&self, raw: &Value) -> Option<Vertex> {
        let (first, second) = components(raw)?;
        let (lat, lng) = if first.abs() > self.swap_threshold {
            (second, first)
        } else {
            (first, second)
        };
        let vertex = Vertex::new(lat, lng);
        vertex.is_valid().then_some(vertex)
    }

    /// Normalize a stored ring, dropping unrecoverable points.
    ///
    /// The result is closed. Fails when fewer than three usable points
    /// remain, in which case the polygon should be treated as absent.
    pub fn normalize_ring(&self, raw: &[Value]) -> Result<Vec<Vertex>, CaptureError> {
        let mut ring = Vec::with_capacity(raw.len() + 1);
        for (index, point) in raw.iter().enumerate() {
            match self.normalize(point) {
                Some(vertex) => ring.push(vertex),
                None => {
                    tracing::warn!(index, point = %point, "Dropping unrecoverable stored point");
                }
            }
        }

        let already_closed = ring.len() > 1 && ring.first() == ring.last();
        let usable = if already_closed {
            ring.len() - 1
        } else {
            ring.len()
        };
        if usable < MIN_RING_POINTS {
            return Err(CaptureError::InvalidStoredGeometry(format!(
                "{} usable points out of {}",
                usable,
                raw.len()
            )));
        }

        if !already_closed {
            ring.push(ring[0]);
        }
        Ok(ring)
    }
}

/// Extract the two numeric components in stored order.
fn components(raw: &Value) -> Option<(f64, f64)> {
    match raw {
        Value::Array(items) if items.len() >= 2 => Some((number(&items[0])?, number(&items[1])?)),
        Value::Object(map) => {
            let lat = map.get("lat").or_else(|| map.get("latitude"))?;
            let lng = map
                .get("lng")
                .or_else(|| map.get("lon"))
                .or_else(|| map.get("longitude"))?;
            Some((number(lat)?, number(lng)?))
        }
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
