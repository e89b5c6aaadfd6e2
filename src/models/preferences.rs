// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user display preferences, owned and persisted by the host.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserPreferences {
    /// Show the "click the first point to close" hint while drawing
    pub show_drawing_hint: bool,
    pub show_overlay_legend: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            show_drawing_hint: true,
            show_overlay_legend: true,
        }
    }
}
