//! Dataset registry. The default export layout is embedded as TOML.
//!
//! The Prométhée layout in `packages/ingest/datasets/prometheus.toml` is
//! baked into the binary at compile time via [`include_str!`]. Other layouts
//! can be loaded from disk with [`load_dataset_config`].

use std::collections::BTreeMap;
use std::path::Path;

use wildfire_incident_models::IncidentField;
use wildfire_ingest_models::DatasetConfig;

use crate::IngestError;

/// Default dataset layout, embedded at compile time.
const PROMETHEUS_TOML: &str = include_str!("../datasets/prometheus.toml");

/// Canonical fields every layout must provide a source column for.
const REQUIRED_FIELDS: &[IncidentField] = &[
    IncidentField::Id,
    IncidentField::Year,
    IncidentField::Department,
    IncidentField::BurntAreaM2,
];

/// Returns the embedded Prométhée layout.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (this is a compile-time
/// guarantee since the config is embedded and covered by tests).
#[must_use]
pub fn default_dataset() -> DatasetConfig {
    parse_dataset_toml(PROMETHEUS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse prometheus.toml: {e}"))
}

/// Reads and validates a dataset layout from a TOML file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, is not valid TOML,
/// or describes an unusable layout.
pub fn load_dataset_config(path: &Path) -> Result<DatasetConfig, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let config = parse_dataset_toml(&text)?;
    log::debug!("Loaded dataset layout '{}' from {}", config.id, path.display());
    Ok(config)
}

/// Parses and validates a dataset layout from a TOML string.
///
/// # Errors
///
/// Returns [`IngestError`] if the TOML is malformed or the layout is
/// unusable.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetConfig, IngestError> {
    let config: DatasetConfig = toml::from_str(toml_str)?;
    validate(&config)?;
    Ok(config)
}

/// Returns the delimiter of a layout as a single byte.
///
/// # Errors
///
/// Returns [`IngestError::Config`] if the delimiter is not exactly one
/// ASCII character.
pub fn delimiter_byte(config: &DatasetConfig) -> Result<u8, IngestError> {
    match config.delimiter.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(IngestError::Config {
            message: format!(
                "{}: delimiter must be a single ASCII character, got {:?}",
                config.id, config.delimiter
            ),
        }),
    }
}

fn validate(config: &DatasetConfig) -> Result<(), IngestError> {
    delimiter_byte(config)?;

    let mut targets: BTreeMap<IncidentField, &str> = BTreeMap::new();
    for (header, field) in &config.columns.renames {
        if matches!(
            field,
            IncidentField::Commune
                | IncidentField::AlertDate
                | IncidentField::AlertTime
                | IncidentField::BurntAreaHa
        ) {
            return Err(IngestError::Config {
                message: format!(
                    "{}: column '{header}' cannot be renamed to derived field '{field}'",
                    config.id
                ),
            });
        }
        if let Some(previous) = targets.insert(*field, header) {
            return Err(IngestError::Config {
                message: format!(
                    "{}: columns '{previous}' and '{header}' both map to '{field}'",
                    config.id
                ),
            });
        }
    }

    for field in REQUIRED_FIELDS {
        if !targets.contains_key(field) {
            return Err(IngestError::Config {
                message: format!("{}: no source column maps to '{field}'", config.id),
            });
        }
    }

    if config.alert.date_formats.is_empty() {
        return Err(IngestError::Config {
            message: format!("{}: at least one alert date format is required", config.id),
        });
    }

    Ok(())
}
