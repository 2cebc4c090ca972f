#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset layout configuration and ingestion result types.
//!
//! A [`DatasetConfig`] captures everything specific to one export format:
//! delimiter, leading metadata rows, header renames, alert timestamp
//! formats, and the sentinel values used for missing cells. Configs are
//! written in TOML and deserialized with `serde`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wildfire_incident_models::{IncidentField, MISSING_ALERT_ORIGIN, UNKNOWN_LABEL};

// ── Dataset definition ───────────────────────────────────────────────────

/// A complete, config-driven description of a fire-record export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Unique identifier (e.g., `"prometheus"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: String,
    /// Number of metadata rows before the header row.
    pub skip_rows: usize,
    /// Header mapping.
    pub columns: ColumnMapping,
    /// How the combined alert timestamp is laid out.
    pub alert: AlertFormat,
    /// Values substituted for missing cells.
    #[serde(default)]
    pub defaults: Sentinels,
}

// ── Column mapping ───────────────────────────────────────────────────────

/// Maps source column headers to canonical incident fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Source header → canonical field. Headers not listed here pass
    /// through under their original name.
    pub renames: BTreeMap<String, IncidentField>,
    /// Source header of the commune column, which keeps its name but is
    /// cleaned like the locality column.
    pub commune: String,
}

impl ColumnMapping {
    /// Returns the canonical field a source header maps to, if any.
    #[must_use]
    pub fn canonical(&self, header: &str) -> Option<IncidentField> {
        if header == self.commune {
            return Some(IncidentField::Commune);
        }
        self.renames.get(header).copied()
    }
}

// ── Alert timestamp ──────────────────────────────────────────────────────

/// Layout of the combined `"<date> <time>"` alert column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFormat {
    /// Source header of the alert column.
    pub column: String,
    /// `chrono` formats tried in order for the date token.
    pub date_formats: Vec<String>,
    /// `chrono` format for the time token.
    pub time_format: String,
}

// ── Sentinels ────────────────────────────────────────────────────────────

/// Values written in place of missing cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentinels {
    /// Substitute for a missing commune or locality.
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
    /// Substitute for a missing alert origin.
    #[serde(default = "default_missing_alert_origin")]
    pub missing_alert_origin: i64,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            unknown_label: default_unknown_label(),
            missing_alert_origin: default_missing_alert_origin(),
        }
    }
}

fn default_unknown_label() -> String {
    UNKNOWN_LABEL.to_string()
}

const fn default_missing_alert_origin() -> i64 {
    MISSING_ALERT_ORIGIN
}

// ── Results ──────────────────────────────────────────────────────────────

/// Summary of a completed load, logged once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    /// Data rows read (excluding metadata and header rows).
    pub rows: u64,
    /// Distinct years present.
    pub years: u64,
    /// Distinct departments present.
    pub departments: u64,
    /// Rows whose commune was missing and filled.
    pub filled_communes: u64,
    /// Rows whose locality was missing and filled.
    pub filled_places: u64,
    /// Rows whose alert origin was missing and filled.
    pub filled_alert_origins: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            renames: BTreeMap::from([
                ("Année".to_string(), IncidentField::Year),
                ("Lieu-dit".to_string(), IncidentField::Place),
            ]),
            commune: "Commune".to_string(),
        }
    }

    #[test]
    fn resolves_renamed_headers() {
        let mapping = mapping();
        assert_eq!(mapping.canonical("Année"), Some(IncidentField::Year));
        assert_eq!(mapping.canonical("Lieu-dit"), Some(IncidentField::Place));
        assert_eq!(mapping.canonical("Commune"), Some(IncidentField::Commune));
        assert_eq!(mapping.canonical("Nature"), None);
    }

    #[test]
    fn sentinels_default_to_shared_constants() {
        let defaults = Sentinels::default();
        assert_eq!(defaults.unknown_label, UNKNOWN_LABEL);
        assert_eq!(defaults.missing_alert_origin, MISSING_ALERT_ORIGIN);
    }
}
