#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the wildfire statistics pipeline.
//!
//! Loads a Prométhée export, prints fire counts, burnt area totals and
//! statistics for the requested years, writes the line and pie charts, and
//! runs one ANOVA per categorical field.

mod pipeline;
mod report;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "wildfire", about = "Wildfire statistics for Prométhée exports")]
struct Cli {
    /// Semicolon-delimited Prométhée export
    #[arg(long, alias = "input_base")]
    input_base: PathBuf,

    /// Comma-separated years to aggregate (e.g., "2019,2020")
    #[arg(long, alias = "input_year", value_delimiter = ',', required = true)]
    input_year: Vec<i32>,

    /// Comma-separated departments to aggregate. All departments if omitted.
    #[arg(long, alias = "input_department", value_delimiter = ',')]
    input_department: Vec<String>,

    /// Directory the charts are written to (created if absent)
    #[arg(long, alias = "input_savepath")]
    input_savepath: PathBuf,

    /// Categorical fields to test, one ANOVA each (e.g., `department fire_type`)
    #[arg(long, alias = "input_category_variable", num_args = 1.., required = true)]
    input_category_variable: Vec<String>,

    /// Continuous field compared across categories (e.g., `burnt_area_ha`)
    #[arg(long, alias = "input_continuous_variable")]
    input_continuous_variable: String,

    /// Dataset layout TOML (overrides `WILDFIRE_DATASET_CONFIG`)
    #[arg(long)]
    dataset_config: Option<PathBuf>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = wildfire_cli_utils::init_logger();

    pipeline::run(&cli, &multi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_lists() {
        let cli = Cli::try_parse_from([
            "wildfire",
            "--input-base",
            "export.csv",
            "--input-year",
            "2019,2020",
            "--input-department",
            "13,83",
            "--input-savepath",
            "out",
            "--input-category-variable",
            "department",
            "fire_type",
            "--input-continuous-variable",
            "burnt_area_ha",
        ])
        .unwrap();

        assert_eq!(cli.input_year, vec![2019, 2020]);
        assert_eq!(cli.input_department, vec!["13", "83"]);
        assert_eq!(cli.input_category_variable, vec!["department", "fire_type"]);
        assert!(!cli.json);
    }

    #[test]
    fn accepts_underscore_flags() {
        let cli = Cli::try_parse_from([
            "wildfire",
            "--input_base",
            "export.csv",
            "--input_year",
            "2019",
            "--input_savepath",
            "out",
            "--input_category_variable",
            "department",
            "--input_continuous_variable",
            "burnt_area_ha",
        ])
        .unwrap();

        assert!(cli.input_department.is_empty());
        assert_eq!(cli.input_continuous_variable, "burnt_area_ha");
    }

    #[test]
    fn missing_years_is_a_usage_error() {
        let err = Cli::try_parse_from([
            "wildfire",
            "--input-base",
            "export.csv",
            "--input-savepath",
            "out",
            "--input-category-variable",
            "department",
            "--input-continuous-variable",
            "burnt_area_ha",
        ])
        .unwrap_err();

        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_integer_year_is_a_usage_error() {
        let err = Cli::try_parse_from([
            "wildfire",
            "--input-base",
            "export.csv",
            "--input-year",
            "2019,twenty",
            "--input-savepath",
            "out",
            "--input-category-variable",
            "department",
            "--input-continuous-variable",
            "burnt_area_ha",
        ])
        .unwrap_err();

        assert_eq!(err.exit_code(), 2);
    }
}
