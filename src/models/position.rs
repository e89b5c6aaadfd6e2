// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location samples and the filtered position derived from them.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single fix from the device location stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy radius; smaller is better
    pub accuracy_meters: f64,
    /// Capture time in Unix milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub captured_at_ms: i64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, captured_at_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at_ms,
        }
    }

    /// Whether the sample can contribute to a filtered position.
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.accuracy_meters.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
            && self.accuracy_meters >= 0.0
    }
}

/// Smoothed current position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FilteredPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&PositionSample> for FilteredPosition {
    fn from(sample: &PositionSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
        }
    }
}

/// Diagnostics over the sample buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FilterStats {
    /// Samples currently in the ring buffer
    pub buffered: usize,
    /// Plausible samples inside the recency window
    pub recent: usize,
    pub best_accuracy_meters: Option<f64>,
    /// Number of positions applied this session
    pub applied_updates: u32,
}
