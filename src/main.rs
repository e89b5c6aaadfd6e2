// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habitat-Capture API Server
//!
//! Backs the habitat survey map widget: filters device positions, captures
//! habitat polygons and draws protected-parcel overlays.

use habitat_capture::{
    config::Config, models::UserPreferences, routes::create_router, session::CaptureSession,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        parcel_service = %config.parcel_service_url,
        place_lookup = %config.place_lookup_url,
        "Starting Habitat-Capture API"
    );

    let session = CaptureSession::headless(&config, UserPreferences::default());
    let state = Arc::new(AppState::new(config.clone(), session));

    // Initial overlay load. A failure is not fatal; the map works without
    // overlays and the frontend can retry via /api/parcels/refresh.
    match state.refresh_parcels().await {
        Ok(count) => tracing::info!(count, "Overlay parcels loaded"),
        Err(e) => tracing::warn!(error = %e, "Starting without overlay parcels"),
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("habitat_capture=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
