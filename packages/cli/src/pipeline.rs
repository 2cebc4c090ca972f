//! Runs the load, aggregate, chart, and ANOVA stages in order.

use std::time::Instant;

use wildfire_analytics::{count_fires, stats_burnt_area, sum_burnt_area, test_anova};
use wildfire_analytics_models::IncidentFilter;
use wildfire_charts::{ChartOptions, pie_charts_per_year, plot_burnt_area};
use wildfire_cli_utils::{IndicatifProgress, MultiProgress};

use crate::Cli;
use crate::report::RunReport;

const TOTAL_STEPS: usize = 4;

/// Executes every stage and prints the report. The first failure aborts
/// the run.
pub fn run(cli: &Cli, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let dataset = wildfire_ingest::resolve_dataset(cli.dataset_config.as_deref())?;

    // --- Load ---
    let load_bar = IndicatifProgress::records_bar(
        multi,
        &format!("[1/{TOTAL_STEPS}] Loading {}", cli.input_base.display()),
    );
    let (table, summary) =
        wildfire_ingest::load_incidents(&cli.input_base, &dataset, Some(load_bar))?;

    // --- Aggregate ---
    log::info!("[2/{TOTAL_STEPS}] Aggregating");
    let filter = IncidentFilter::new(&cli.input_year, Some(cli.input_department.as_slice()));
    let fire_counts = count_fires(&table, &filter);
    let burnt_area_sums = sum_burnt_area(&table, &filter);
    let burnt_area_stats = stats_burnt_area(&table, &filter);
    if fire_counts.is_empty() {
        log::warn!("No incidents match the requested years and departments");
    }

    // --- Charts ---
    let options = ChartOptions::default();
    let mut charts = vec![plot_burnt_area(&table, &cli.input_savepath, &options)?];
    let pie_bar = IndicatifProgress::steps_bar(
        multi,
        &format!("[3/{TOTAL_STEPS}] Pie charts"),
        table.years().len() as u64,
    );
    charts.extend(pie_charts_per_year(
        &table,
        &cli.input_savepath,
        &options,
        Some(pie_bar),
    )?);

    // --- ANOVA ---
    log::info!(
        "[4/{TOTAL_STEPS}] ANOVA of {} across {} field(s)",
        cli.input_continuous_variable,
        cli.input_category_variable.len()
    );
    let anova = cli
        .input_category_variable
        .iter()
        .map(|categorical| test_anova(&table, categorical, &cli.input_continuous_variable))
        .collect::<Result<Vec<_>, _>>()?;

    let report = RunReport {
        summary,
        fire_counts,
        burnt_area_sums,
        burnt_area_stats,
        charts,
        anova,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{report}");
    }

    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
