// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place attributes returned by the place-lookup service.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlaceInfo {
    pub place: String,
    pub municipality: String,
    /// Meters above sea level, as reported
    pub elevation: String,
    pub exposure: String,
    pub slope: String,
    #[serde(default)]
    pub cadastre: Option<String>,
}

impl PlaceInfo {
    /// Placeholder used when the lookup fails.
    pub fn unknown() -> Self {
        Self {
            place: UNKNOWN.to_string(),
            municipality: UNKNOWN.to_string(),
            elevation: UNKNOWN.to_string(),
            exposure: UNKNOWN.to_string(),
            slope: UNKNOWN.to_string(),
            cadastre: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.place == UNKNOWN && self.municipality == UNKNOWN
    }
}
