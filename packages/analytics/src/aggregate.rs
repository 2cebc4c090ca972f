//! Per (year, department) aggregations of burnt area and fire counts.
//!
//! Every aggregation applies an [`IncidentFilter`] first and returns an
//! ordered map keyed by [`YearDepartment`]. Only groups with at least one
//! matching fire appear in the result.

use std::collections::BTreeMap;

use wildfire_analytics_models::{BurntAreaStats, IncidentFilter, YearDepartment};
use wildfire_incident_models::IncidentRecord;
use wildfire_ingest::IncidentTable;

/// Decimal places of [`sum_burnt_area`] results.
pub const SUM_DECIMALS: i32 = 2;

/// Decimal places of [`stats_burnt_area`] results.
pub const STATS_DECIMALS: i32 = 3;

/// Counts fires per (year, department).
#[must_use]
pub fn count_fires(table: &IncidentTable, filter: &IncidentFilter) -> BTreeMap<YearDepartment, u64> {
    let mut counts = BTreeMap::new();
    for record in filtered(table, filter) {
        *counts.entry(key(record)).or_insert(0) += 1;
    }
    log::debug!("count_fires: {} groups", counts.len());
    counts
}

/// Sums burnt area in hectares per (year, department), rounded to 2
/// decimal places.
#[must_use]
pub fn sum_burnt_area(
    table: &IncidentTable,
    filter: &IncidentFilter,
) -> BTreeMap<YearDepartment, f64> {
    grouped_areas(table, filter)
        .into_iter()
        .map(|(k, areas)| (k, round_to(areas.iter().sum(), SUM_DECIMALS)))
        .collect()
}

/// Describes the burnt area distribution (hectares) per (year, department).
///
/// Quartiles use linear interpolation between closest ranks. Standard
/// deviation is the sample standard deviation and is absent for a group
/// of one fire.
#[must_use]
pub fn stats_burnt_area(
    table: &IncidentTable,
    filter: &IncidentFilter,
) -> BTreeMap<YearDepartment, BurntAreaStats> {
    grouped_areas(table, filter)
        .into_iter()
        .map(|(k, areas)| (k, describe(areas)))
        .collect()
}

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn key(record: &IncidentRecord) -> YearDepartment {
    YearDepartment::new(record.year, record.department.as_str())
}

fn filtered<'a>(
    table: &'a IncidentTable,
    filter: &'a IncidentFilter,
) -> impl Iterator<Item = &'a IncidentRecord> + 'a {
    table
        .iter()
        .filter(move |r| filter.matches(r.year, &r.department))
}

fn grouped_areas(
    table: &IncidentTable,
    filter: &IncidentFilter,
) -> BTreeMap<YearDepartment, Vec<f64>> {
    let mut groups: BTreeMap<YearDepartment, Vec<f64>> = BTreeMap::new();
    for record in filtered(table, filter) {
        groups.entry(key(record)).or_default().push(record.burnt_area_ha);
    }
    groups
}

#[allow(clippy::cast_precision_loss)]
fn describe(mut areas: Vec<f64>) -> BurntAreaStats {
    areas.sort_by(f64::total_cmp);
    let n = areas.len();
    let mean = areas.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = areas.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    let r = |v: f64| round_to(v, STATS_DECIMALS);
    BurntAreaStats {
        count: n as u64,
        mean: r(mean),
        std: std.map(r),
        min: r(areas[0]),
        p25: r(quantile(&areas, 0.25)),
        p50: r(quantile(&areas, 0.5)),
        p75: r(quantile(&areas, 0.75)),
        max: r(areas[n - 1]),
    }
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
