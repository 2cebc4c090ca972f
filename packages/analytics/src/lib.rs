#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and significance testing over normalized wildfire incidents.
//!
//! [`aggregate`] groups filtered incidents by (year, department) to count
//! fires, sum burnt area, and describe its distribution. [`anova`] runs a
//! one-way analysis of variance of a continuous field across the groups of
//! a categorical field.

pub mod aggregate;
pub mod anova;

#[cfg(test)]
mod fixtures;

use thiserror::Error;

pub use aggregate::{count_fires, stats_burnt_area, sum_burnt_area};
pub use anova::test_anova;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A field name does not resolve to a usable column.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of what went wrong.
        message: String,
    },

    /// The requested test is undefined for the data.
    #[error("Statistical error: {message}")]
    Statistical {
        /// Description of what went wrong.
        message: String,
    },
}
