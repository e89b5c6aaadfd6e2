// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine error taxonomy and its HTTP rendering.

use crate::models::MapMode;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Failure reported by the device location stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,
}

/// Errors raised by the capture engine and its collaborators.
///
/// None of these are fatal for the widget: the map stays interactive and
/// the user can always fall back to placing vertices by hand.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("Location unavailable")]
    LocationUnavailable,

    #[error("Location permission denied")]
    LocationPermissionDenied,

    #[error("Timed out waiting for a location fix")]
    LocationTimeout,

    #[error("Insufficient points: {count} distinct vertices, at least 3 required")]
    InsufficientVertices { count: usize },

    #[error("Polygon is not closed")]
    UnclosedPolygon,

    #[error("Polygon is already closed")]
    PolygonClosed,

    #[error("Polygon must be closed before its vertices can be dragged")]
    PolygonNotClosed,

    #[error("Vertex index {index} out of range ({len} vertices)")]
    VertexOutOfRange { index: usize, len: usize },

    #[error("Polygon editing mode is not active")]
    NotEditing,

    #[error("Cannot toggle into {0:?} mode")]
    InvalidModeTarget(MapMode),

    #[error("Invalid stored geometry: {0}")]
    InvalidStoredGeometry(String),

    #[error("Place lookup failed: {0}")]
    LookupFailed(String),

    #[error("Place lookup superseded by a newer request")]
    LookupSuperseded,

    #[error("Parcel fetch failed: {0}")]
    ParcelFetchFailed(String),
}

impl From<LocationError> for CaptureError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => CaptureError::LocationPermissionDenied,
            LocationError::Unavailable => CaptureError::LocationUnavailable,
            LocationError::Timeout => CaptureError::LocationTimeout,
        }
    }
}

impl CaptureError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::LocationUnavailable => "location_unavailable",
            CaptureError::LocationPermissionDenied => "location_permission_denied",
            CaptureError::LocationTimeout => "location_timeout",
            CaptureError::InsufficientVertices { .. } => "insufficient_vertices",
            CaptureError::UnclosedPolygon => "unclosed_polygon",
            CaptureError::PolygonClosed => "polygon_closed",
            CaptureError::PolygonNotClosed => "polygon_not_closed",
            CaptureError::VertexOutOfRange { .. } => "vertex_out_of_range",
            CaptureError::NotEditing => "not_editing",
            CaptureError::InvalidModeTarget(_) => "invalid_mode_target",
            CaptureError::InvalidStoredGeometry(_) => "invalid_stored_geometry",
            CaptureError::LookupFailed(_) => "lookup_failed",
            CaptureError::LookupSuperseded => "lookup_superseded",
            CaptureError::ParcelFetchFailed(_) => "parcel_fetch_failed",
        }
    }

    /// Corrective, user-facing message for banners and form hints.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::LocationUnavailable => {
                "Your position is currently unavailable. Place the points on the map by hand."
                    .to_string()
            }
            CaptureError::LocationPermissionDenied => {
                "Location access was denied. Place the points on the map by hand.".to_string()
            }
            CaptureError::LocationTimeout => {
                "No position fix yet. Place the points on the map by hand.".to_string()
            }
            CaptureError::InsufficientVertices { count } => format!(
                "Insufficient points: the area needs at least 3 points, {} placed so far.",
                count
            ),
            CaptureError::UnclosedPolygon => {
                "The area is not closed yet. Click the first point again to close it.".to_string()
            }
            CaptureError::PolygonClosed => {
                "The area is already closed. Drag its points to adjust it, or restart.".to_string()
            }
            CaptureError::PolygonNotClosed => {
                "Close the area before moving its points.".to_string()
            }
            CaptureError::VertexOutOfRange { .. } => "That point no longer exists.".to_string(),
            CaptureError::NotEditing => "Switch to drawing mode to change the area.".to_string(),
            CaptureError::InvalidModeTarget(_) => "That map mode cannot be selected.".to_string(),
            CaptureError::InvalidStoredGeometry(_) => {
                "The saved area could not be read and was ignored.".to_string()
            }
            CaptureError::LookupFailed(_) | CaptureError::LookupSuperseded => {
                "Location details could not be loaded.".to_string()
            }
            CaptureError::ParcelFetchFailed(_) => {
                "Other surveyed areas could not be loaded.".to_string()
            }
        }
    }

    /// Whether this error came from the device location source.
    pub fn is_location_error(&self) -> bool {
        matches!(
            self,
            CaptureError::LocationUnavailable
                | CaptureError::LocationPermissionDenied
                | CaptureError::LocationTimeout
        )
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Capture(err) => {
                let status = match err {
                    CaptureError::InsufficientVertices { .. }
                    | CaptureError::UnclosedPolygon
                    | CaptureError::InvalidStoredGeometry(_)
                    | CaptureError::VertexOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    CaptureError::PolygonClosed
                    | CaptureError::PolygonNotClosed
                    | CaptureError::NotEditing
                    | CaptureError::InvalidModeTarget(_)
                    | CaptureError::LookupSuperseded => StatusCode::CONFLICT,
                    CaptureError::LookupFailed(msg) | CaptureError::ParcelFetchFailed(msg) => {
                        tracing::warn!(error = %msg, code = err.code(), "Upstream service error");
                        StatusCode::BAD_GATEWAY
                    }
                    CaptureError::LocationUnavailable
                    | CaptureError::LocationPermissionDenied
                    | CaptureError::LocationTimeout => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, err.code(), Some(err.user_message()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
