// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habitat-Capture: map-based habitat polygon capture for field surveys
//!
//! This crate provides the capture engine behind a survey map widget
//! (position filtering, polygon capture with geodesic area, protected
//! parcel overlays) and the HTTP API the web frontend drives it through.

pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod surface;
pub mod time_utils;

use config::Config;
use models::ParcelFilter;
use services::{ChannelLocationSource, LocationFeed, ParcelDirectory, PlaceLookupService};
use session::CaptureSession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// The capture session. Every operation runs under this lock, one at a time.
    pub session: Arc<Mutex<CaptureSession>>,
    pub location: ChannelLocationSource,
    /// Running location feed, if any.
    pub feed: Mutex<Option<LocationFeed>>,
    pub place_lookup: PlaceLookupService,
    pub parcels: ParcelDirectory,
    /// Filter for overlay fetches; excludes the record being edited.
    pub parcel_filter: Mutex<ParcelFilter>,
}

impl AppState {
    pub fn new(config: Config, session: CaptureSession) -> Self {
        let place_lookup = PlaceLookupService::new(&config.place_lookup_url, config.http_timeout);
        let parcels = ParcelDirectory::new(&config.parcel_service_url, config.http_timeout)
            .with_paging(config.parcel_page_size, config.parcel_max_pages);
        Self {
            config,
            session: Arc::new(Mutex::new(session)),
            location: ChannelLocationSource::default(),
            feed: Mutex::new(None),
            place_lookup,
            parcels,
            parcel_filter: Mutex::new(ParcelFilter::default()),
        }
    }

    /// Fetch overlay parcels and hand them to the session.
    ///
    /// On failure the existing overlays stay and the session shows a banner.
    pub async fn refresh_parcels(&self) -> Result<usize, error::CaptureError> {
        let filter = self.parcel_filter.lock().await.clone();
        match self.parcels.fetch_parcels(&filter).await {
            Ok(records) => Ok(self.session.lock().await.set_parcels(&records)),
            Err(e) => {
                self.session.lock().await.parcel_fetch_failed(&e);
                Err(e)
            }
        }
    }
}
