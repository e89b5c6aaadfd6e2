// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The filtering and normalization constants are field-tuned heuristics,
//! so every one of them can be overridden without a rebuild.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Tunables for the position sample filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Maximum number of samples kept in the ring buffer
    pub buffer_capacity: usize,
    /// Minimum spacing between applied positions, in milliseconds
    pub throttle_ms: i64,
    /// Samples older than this (relative to the newest) are ignored
    pub window_ms: i64,
    /// Below this many recent samples the newest sample is used as-is
    pub min_samples: usize,
    /// Share of the most accurate samples that gets averaged
    pub best_fraction: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 30,
            throttle_ms: 1_000,
            window_ms: 20_000,
            min_samples: 5,
            best_fraction: 0.66,
        }
    }
}

/// Tunables for the capture session and overlay layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// A stored first component beyond this magnitude is taken as a longitude
    pub axis_swap_threshold: f64,
    /// Background clicks this soon after a shape click are swallowed
    pub click_dedupe_ms: i64,
    /// Zoom level used when centering on the first fix
    pub locate_zoom: f64,
    /// Upper bound on the "waiting for first fix" state
    pub first_fix_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            axis_swap_threshold: 90.0,
            click_dedupe_ms: 300,
            locate_zoom: 17.0,
            first_fix_timeout: Duration::from_secs(15),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Base URL of the habitat-record parcel directory
    pub parcel_service_url: String,
    /// Base URL of the place-lookup service
    pub place_lookup_url: String,
    /// Parcels requested per directory page (service caps this at 100)
    pub parcel_page_size: u32,
    /// Upper bound on directory pages fetched per refresh
    pub parcel_max_pages: u32,
    /// Timeout for outbound HTTP requests
    pub http_timeout: Duration,

    pub filter: FilterConfig,
    pub session: SessionConfig,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            parcel_service_url: "http://127.0.0.1:9001".to_string(),
            place_lookup_url: "http://127.0.0.1:9002".to_string(),
            parcel_page_size: 100,
            parcel_max_pages: 10,
            http_timeout: Duration::from_secs(10),
            filter: FilterConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Service URLs are required; every tunable falls back to its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            parcel_service_url: required_url("PARCEL_SERVICE_URL")?,
            place_lookup_url: required_url("PLACE_LOOKUP_URL")?,
            parcel_page_size: parse_var::<u32>("PARCEL_PAGE_SIZE")?
                .unwrap_or(defaults.parcel_page_size)
                .clamp(1, 100),
            parcel_max_pages: parse_var("PARCEL_MAX_PAGES")?.unwrap_or(defaults.parcel_max_pages),
            http_timeout: parse_var("HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            filter: FilterConfig {
                buffer_capacity: parse_var("FILTER_BUFFER_CAPACITY")?
                    .unwrap_or(defaults.filter.buffer_capacity),
                throttle_ms: parse_var("FILTER_THROTTLE_MS")?.unwrap_or(defaults.filter.throttle_ms),
                window_ms: parse_var("FILTER_WINDOW_MS")?.unwrap_or(defaults.filter.window_ms),
                min_samples: parse_var("FILTER_MIN_SAMPLES")?.unwrap_or(defaults.filter.min_samples),
                best_fraction: parse_var("FILTER_BEST_FRACTION")?
                    .unwrap_or(defaults.filter.best_fraction),
            },
            session: SessionConfig {
                axis_swap_threshold: parse_var("AXIS_SWAP_THRESHOLD")?
                    .unwrap_or(defaults.session.axis_swap_threshold),
                click_dedupe_ms: parse_var("CLICK_DEDUPE_MS")?
                    .unwrap_or(defaults.session.click_dedupe_ms),
                locate_zoom: parse_var("LOCATE_ZOOM")?.unwrap_or(defaults.session.locate_zoom),
                first_fix_timeout: parse_var("FIRST_FIX_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.session.first_fix_timeout),
            },
        })
    }

    /// Config with local stand-in service URLs, for tests.
    pub fn test_default() -> Self {
        Self::default()
    }
}

fn required_url(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
