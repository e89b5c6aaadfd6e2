// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map interaction modes.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Which interaction currently owns the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MapMode {
    /// Free pan/zoom, following the filtered position
    #[default]
    Navigation,
    /// Placing or dragging polygon vertices; camera locked
    PolygonEditing,
    /// Read-only inspection
    Idle,
}

impl MapMode {
    /// Modes that have a toggle button.
    pub fn is_toggleable(self) -> bool {
        matches!(self, MapMode::Navigation | MapMode::PolygonEditing)
    }

    pub fn cursor(self) -> CursorStyle {
        match self {
            MapMode::Navigation => CursorStyle::Grab,
            MapMode::PolygonEditing => CursorStyle::Crosshair,
            MapMode::Idle => CursorStyle::Pointer,
        }
    }
}

/// Cursor affordance shown over the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CursorStyle {
    #[default]
    Grab,
    Crosshair,
    Pointer,
}
