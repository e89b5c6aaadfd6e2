// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place-lookup client (reverse geocoding plus terrain attributes).
//!
//! A lookup for a coordinate supersedes any lookup for the same coordinate
//! still in flight: the older call resolves to `LookupSuperseded` instead
//! of racing the newer one to the caller.

use crate::error::CaptureError;
use crate::models::PlaceInfo;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Coordinates are compared at micro-degree precision (about 0.1 m).
const KEY_SCALE: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordinateKey(i64, i64);

impl CoordinateKey {
    fn new(lat: f64, lng: f64) -> Self {
        Self(
            (lat * KEY_SCALE).round() as i64,
            (lng * KEY_SCALE).round() as i64,
        )
    }
}

/// Wire response; attribute types vary between deployments.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    place: Option<String>,
    municipality: Option<String>,
    elevation: Option<Value>,
    exposure: Option<Value>,
    slope: Option<Value>,
    cadastre: Option<Value>,
}

impl From<LookupResponse> for PlaceInfo {
    fn from(r: LookupResponse) -> Self {
        let unknown = PlaceInfo::unknown();
        PlaceInfo {
            place: r.place.unwrap_or(unknown.place),
            municipality: r.municipality.unwrap_or(unknown.municipality),
            elevation: r.elevation.and_then(text).unwrap_or(unknown.elevation),
            exposure: r.exposure.and_then(text).unwrap_or(unknown.exposure),
            slope: r.slope.and_then(text).unwrap_or(unknown.slope),
            cadastre: r.cadastre.and_then(text),
        }
    }
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Claim on a coordinate's in-flight slot, released even if the lookup
/// future is dropped before completion.
struct Ticket<'a> {
    in_flight: &'a DashMap<CoordinateKey, u64>,
    key: CoordinateKey,
    id: u64,
    released: bool,
}

impl Ticket<'_> {
    /// Release the slot; `false` if a newer lookup took it over.
    fn release(mut self) -> bool {
        self.released = true;
        self.in_flight
            .remove_if(&self.key, |_, latest| *latest == self.id)
            .is_some()
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.in_flight
                .remove_if(&self.key, |_, latest| *latest == self.id);
        }
    }
}

#[derive(Clone)]
pub struct PlaceLookupService {
    http: reqwest::Client,
    base_url: String,
    in_flight: Arc<DashMap<CoordinateKey, u64>>,
    next_ticket: Arc<AtomicU64>,
}

impl PlaceLookupService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            in_flight: Arc::new(DashMap::new()),
            next_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Look up place attributes for a coordinate.
    pub async fn lookup(&self, lat: f64, lng: f64) -> Result<PlaceInfo, CaptureError> {
        if !(lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0) {
            return Err(CaptureError::LookupFailed(format!(
                "coordinate out of range: {}, {}",
                lat, lng
            )));
        }

        let key = CoordinateKey::new(lat, lng);
        let id = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if self.in_flight.insert(key, id).is_some() {
            tracing::debug!(lat, lng, "Superseding in-flight place lookup");
        }
        let ticket = Ticket {
            in_flight: &self.in_flight,
            key,
            id,
            released: false,
        };

        let result = self.fetch(lat, lng).await;

        // Only the latest ticket for the key may deliver a result.
        if !ticket.release() {
            return Err(CaptureError::LookupSuperseded);
        }
        result
    }

    /// Look up, falling back to placeholder values on any failure.
    pub async fn lookup_or_unknown(&self, lat: f64, lng: f64) -> (PlaceInfo, Option<CaptureError>) {
        match self.lookup(lat, lng).await {
            Ok(place) => (place, None),
            Err(e) => {
                tracing::warn!(lat, lng, error = %e, "Place lookup failed, using placeholders");
                (PlaceInfo::unknown(), Some(e))
            }
        }
    }

    /// Number of coordinates with a lookup in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    async fn fetch(&self, lat: f64, lng: f64) -> Result<PlaceInfo, CaptureError> {
        let url = format!("{}/lookup", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .send()
            .await
            .map_err(|e| CaptureError::LookupFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptureError::LookupFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: LookupResponse = response
            .json()
            .await
            .map_err(|e| CaptureError::LookupFailed(format!("invalid response: {}", e)))?;
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_attributes_become_text() {
        let response: LookupResponse = serde_json::from_value(json!({
            "place": "Alpe di Siusi",
            "municipality": "Castelrotto",
            "elevation": 1850,
            "exposure": "S",
            "slope": 12.5
        }))
        .unwrap();
        let place = PlaceInfo::from(response);
        assert_eq!(place.elevation, "1850");
        assert_eq!(place.slope, "12.5");
        assert_eq!(place.cadastre, None);
    }

    #[test]
    fn test_missing_attributes_are_unknown() {
        let response: LookupResponse = serde_json::from_value(json!({})).unwrap();
        let place = PlaceInfo::from(response);
        assert!(place.is_unknown());
    }

    #[test]
    fn test_nearby_coordinates_share_key() {
        assert_eq!(
            CoordinateKey::new(46.7200001, 11.65),
            CoordinateKey::new(46.72, 11.6500002)
        );
        assert_ne!(
            CoordinateKey::new(46.72, 11.65),
            CoordinateKey::new(46.73, 11.65)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_rejected_without_request() {
        let service = PlaceLookupService::new("http://127.0.0.1:1", Duration::from_secs(1));
        let result = service.lookup(95.0, 11.0).await;
        assert!(matches!(result, Err(CaptureError::LookupFailed(_))));
        assert_eq!(service.in_flight(), 0);
    }
}
