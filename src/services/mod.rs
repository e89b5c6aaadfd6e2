// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - capture logic and upstream clients.

pub mod capture;
pub mod location;
pub mod mode;
pub mod normalizer;
pub mod overlay;
pub mod parcel_directory;
pub mod place_lookup;
pub mod position_filter;
pub mod tracker;

pub use capture::CaptureEngine;
pub use location::{ChannelLocationSource, LocationEvent, LocationSource, LocationSubscription};
pub use mode::{ModeController, ModeTransition};
pub use normalizer::CoordinateNormalizer;
pub use overlay::{ClickArbiter, OverlayLayer};
pub use parcel_directory::ParcelDirectory;
pub use place_lookup::PlaceLookupService;
pub use position_filter::PositionFilter;
pub use tracker::{LocationFeed, LocationSink};
