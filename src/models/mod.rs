// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the capture engine.

pub mod mode;
pub mod parcel;
pub mod place;
pub mod polygon;
pub mod position;
pub mod preferences;

pub use mode::{CursorStyle, MapMode};
pub use parcel::{ColorCategory, OverlayParcel, ParcelFilter, ParcelRecord, ProtectionStatus};
pub use place::PlaceInfo;
pub use polygon::{AreaMeasurement, Polygon, PolygonSnapshot, Vertex};
pub use position::{FilterStats, FilteredPosition, PositionSample};
pub use preferences::UserPreferences;
