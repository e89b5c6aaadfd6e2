// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Surveyed habitat parcels shown as read-only overlays.

use crate::models::polygon::Vertex;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Opacity for parcels whose survey has been verified.
pub const VERIFIED_OPACITY: f64 = 0.6;
/// Opacity for provisional parcels.
pub const PROVISIONAL_OPACITY: f64 = 0.3;

/// Protection status recorded for a habitat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProtectionStatus {
    LegallyProtected,
    EcologicallyHighValue,
    EcologicallyLowValue,
}

impl ProtectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionStatus::LegallyProtected => "legally-protected",
            ProtectionStatus::EcologicallyHighValue => "ecologically-high-value",
            ProtectionStatus::EcologicallyLowValue => "ecologically-low-value",
        }
    }

    /// Lenient parse of the directory's status strings.
    ///
    /// Accepts kebab, snake and space separated spellings in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "legally-protected" => Some(ProtectionStatus::LegallyProtected),
            "ecologically-high-value" => Some(ProtectionStatus::EcologicallyHighValue),
            "ecologically-low-value" => Some(ProtectionStatus::EcologicallyLowValue),
            _ => None,
        }
    }
}

/// Fill color category derived from the protection status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ColorCategory {
    LegallyProtected,
    HighValue,
    LowValue,
    #[default]
    Unspecified,
}

impl ColorCategory {
    pub fn hex(self) -> &'static str {
        match self {
            ColorCategory::LegallyProtected => "#d32f2f",
            ColorCategory::HighValue => "#f57c00",
            ColorCategory::LowValue => "#388e3c",
            ColorCategory::Unspecified => "#1976d2",
        }
    }
}

impl From<Option<ProtectionStatus>> for ColorCategory {
    fn from(status: Option<ProtectionStatus>) -> Self {
        match status {
            Some(ProtectionStatus::LegallyProtected) => ColorCategory::LegallyProtected,
            Some(ProtectionStatus::EcologicallyHighValue) => ColorCategory::HighValue,
            Some(ProtectionStatus::EcologicallyLowValue) => ColorCategory::LowValue,
            None => ColorCategory::Unspecified,
        }
    }
}

/// Parcel record as delivered by the habitat-record service.
///
/// The polygon is kept raw: stored points come in several legacy shapes
/// and are reconciled by the coordinate normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub polygon: Vec<serde_json::Value>,
    #[serde(default)]
    pub protection_status: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// A parcel ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OverlayParcel {
    pub id: String,
    pub name: String,
    pub polygon: Vec<Vertex>,
    pub color_category: ColorCategory,
    pub opacity: f64,
    pub verified: bool,
}

impl OverlayParcel {
    /// Build from a record whose polygon has already been normalized.
    pub fn from_record(record: &ParcelRecord, polygon: Vec<Vertex>) -> Self {
        let status = record
            .protection_status
            .as_deref()
            .and_then(ProtectionStatus::parse);
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            polygon,
            color_category: ColorCategory::from(status),
            opacity: if record.verified {
                VERIFIED_OPACITY
            } else {
                PROVISIONAL_OPACITY
            },
            verified: record.verified,
        }
    }
}

/// Query parameters for the parcel directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelFilter {
    /// Record currently being edited; left out of the overlays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_status_parse_variants() {
        assert_eq!(
            ProtectionStatus::parse("legally-protected"),
            Some(ProtectionStatus::LegallyProtected)
        );
        assert_eq!(
            ProtectionStatus::parse("Ecologically_High_Value"),
            Some(ProtectionStatus::EcologicallyHighValue)
        );
        assert_eq!(
            ProtectionStatus::parse(" ecologically low value "),
            Some(ProtectionStatus::EcologicallyLowValue)
        );
        assert_eq!(ProtectionStatus::parse("protected-ish"), None);
    }

    #[test]
    fn test_color_defaults_when_unspecified() {
        assert_eq!(ColorCategory::from(None), ColorCategory::Unspecified);
        assert_eq!(ColorCategory::default().hex(), "#1976d2");
    }

    #[test]
    fn test_verified_parcels_are_more_opaque() {
        let mut record = ParcelRecord {
            id: "p1".to_string(),
            name: "Meadow".to_string(),
            polygon: vec![],
            protection_status: Some("legally-protected".to_string()),
            verified: true,
        };
        let verified = OverlayParcel::from_record(&record, vec![]);
        record.verified = false;
        let provisional = OverlayParcel::from_record(&record, vec![]);

        assert_eq!(verified.color_category, ColorCategory::LegallyProtected);
        assert!(verified.opacity > provisional.opacity);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ProtectionStatus::EcologicallyHighValue).unwrap();
        assert_eq!(json, "\"ecologically-high-value\"");
    }
}
