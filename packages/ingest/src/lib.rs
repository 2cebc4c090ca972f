#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads semicolon-delimited wildfire exports into an in-memory
//! [`IncidentTable`].
//!
//! Loading is a single pass: leading metadata rows are skipped, the header
//! row is resolved against a [`DatasetConfig`], and every data row is
//! normalized by [`normalize::normalize_row`]. Any schema or parse failure
//! aborts the load.

pub mod dataset;
pub mod normalize;
pub mod progress;
pub mod table;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use wildfire_ingest_models::{DatasetConfig, IngestSummary};

pub use dataset::{default_dataset, load_dataset_config};
pub use table::IncidentTable;

use crate::normalize::{HeaderLayout, normalize_row};
use crate::progress::ProgressCallback;

/// Environment variable naming a dataset layout TOML to use instead of the
/// embedded default.
pub const DATASET_CONFIG_ENV: &str = "WILDFIRE_DATASET_CONFIG";

/// Errors that can occur while loading and normalizing an export.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset layout TOML is malformed.
    #[error("Invalid dataset config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The dataset layout is well-formed TOML but unusable.
    #[error("Invalid dataset config: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Missing or duplicate key, missing column, or malformed composite
    /// field.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of what went wrong.
        message: String,
    },

    /// A value could not be parsed.
    #[error("Parse error at line {line}, field '{field}': {message}")]
    Parse {
        /// 1-based line number in the source file.
        line: u64,
        /// Canonical name of the offending field.
        field: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Resolves the dataset layout to use: an explicit path wins, then the
/// [`DATASET_CONFIG_ENV`] environment variable, then the embedded default.
///
/// # Errors
///
/// Returns [`IngestError`] if a configured layout file cannot be loaded.
pub fn resolve_dataset(cli_path: Option<&Path>) -> Result<DatasetConfig, IngestError> {
    if let Some(path) = cli_path {
        return load_dataset_config(path);
    }

    match std::env::var(DATASET_CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => load_dataset_config(Path::new(path.trim())),
        _ => Ok(default_dataset()),
    }
}

/// Loads and normalizes an export file.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, and any error
/// from [`read_incidents`].
pub fn load_incidents(
    path: &Path,
    config: &DatasetConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<(IncidentTable, IngestSummary), IngestError> {
    log::info!("Loading {} ({})", path.display(), config.name);
    let file = std::fs::File::open(path)?;
    read_incidents(file, config, progress)
}

/// Reads and normalizes an export from any reader.
///
/// # Errors
///
/// Returns [`IngestError`] if the input is not valid UTF-8, the header row
/// does not match the layout, a row is malformed, or two rows share an id.
pub fn read_incidents<R: Read>(
    mut reader: R,
    config: &DatasetConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<(IncidentTable, IngestSummary), IngestError> {
    let start = Instant::now();
    let progress = progress.unwrap_or_else(progress::null_progress);

    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let body = skip_lines(text, config.skip_rows);

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(dataset::delimiter_byte(config)?)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = csv_reader.headers()?.clone();
    let layout = HeaderLayout::resolve(&headers, config)?;

    progress.set_total(body.lines().count().saturating_sub(1) as u64);

    let mut records = Vec::new();
    let mut summary = IngestSummary::default();
    let skipped = config.skip_rows as u64;

    for result in csv_reader.records() {
        let row = result?;
        let line = skipped + row.position().map_or(0, csv::Position::line);

        let (record, fills) = normalize_row(&row, &layout, config, line)?;
        summary.filled_communes += u64::from(fills.commune);
        summary.filled_places += u64::from(fills.place);
        summary.filled_alert_origins += u64::from(fills.alert_origin);
        records.push(record);
        progress.inc(1);
    }

    let table = IncidentTable::from_records(records, layout.extra_columns())?;

    summary.rows = table.len() as u64;
    summary.years = table.iter().map(|r| r.year).collect::<BTreeSet<_>>().len() as u64;
    summary.departments = table.departments().len() as u64;

    progress.finish(format!("Loaded {} incidents", summary.rows));
    log::info!(
        "Loaded {} incidents ({} years, {} departments) in {:.1}s",
        summary.rows,
        summary.years,
        summary.departments,
        start.elapsed().as_secs_f64()
    );
    log::debug!(
        "Filled {} communes, {} places, {} alert origins",
        summary.filled_communes,
        summary.filled_places,
        summary.filled_alert_origins
    );

    Ok((table, summary))
}

/// Returns `text` without its first `n` lines.
fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}
