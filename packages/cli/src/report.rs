//! Console and JSON presentation of a run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use wildfire_analytics_models::{
    AnovaReport, BurntAreaStats, GroupValue, Pivot, YearDepartment, group_values,
};
use wildfire_ingest_models::IngestSummary;

/// Everything a run produced.
pub struct RunReport {
    pub summary: IngestSummary,
    pub fire_counts: BTreeMap<YearDepartment, u64>,
    pub burnt_area_sums: BTreeMap<YearDepartment, f64>,
    pub burnt_area_stats: BTreeMap<YearDepartment, BurntAreaStats>,
    pub charts: Vec<PathBuf>,
    pub anova: Vec<AnovaReport>,
}

/// Serialized shape of [`RunReport`]; aggregations become flat rows.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    summary: &'a IngestSummary,
    fire_counts: Vec<GroupValue<u64>>,
    burnt_area_sums: Vec<GroupValue<f64>>,
    burnt_area_stats: Vec<GroupValue<BurntAreaStats>>,
    charts: &'a [PathBuf],
    anova: &'a [AnovaReport],
}

impl RunReport {
    #[must_use]
    pub fn to_json(&self) -> JsonReport<'_> {
        JsonReport {
            summary: &self.summary,
            fire_counts: group_values(&self.fire_counts),
            burnt_area_sums: group_values(&self.burnt_area_sums),
            burnt_area_stats: group_values(&self.burnt_area_stats),
            charts: &self.charts,
            anova: &self.anova,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nCount of fires:")?;
        write_pivot(f, &Pivot::from_map(&self.fire_counts), u64::to_string)?;

        writeln!(f, "\nTotal burnt area (ha):")?;
        write_pivot(f, &Pivot::from_map(&self.burnt_area_sums), |ha| format!("{ha:.2}"))?;

        writeln!(f, "\nBurnt area statistics (ha):")?;
        write_stats(f, &self.burnt_area_stats)?;

        writeln!(f, "\nCharts written:")?;
        for path in &self.charts {
            writeln!(f, "  {}", path.display())?;
        }

        for report in &self.anova {
            write_anova(f, report)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:>width$}"))
        .collect();
    writeln!(f, "{}", line.join("  "))
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[Vec<String>]) -> fmt::Result {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in rows {
        write_row(f, row, &widths)?;
    }
    Ok(())
}

fn write_pivot<T>(
    f: &mut fmt::Formatter<'_>,
    pivot: &Pivot<T>,
    cell: impl Fn(&T) -> String,
) -> fmt::Result {
    if pivot.is_empty() {
        return writeln!(f, "  (no matching incidents)");
    }

    let mut rows = Vec::with_capacity(pivot.years.len() + 1);
    rows.push(
        std::iter::once("year".to_string())
            .chain(pivot.departments.iter().cloned())
            .collect(),
    );
    for (year, cells) in pivot.years.iter().zip(&pivot.cells) {
        rows.push(
            std::iter::once(year.to_string())
                .chain(
                    cells
                        .iter()
                        .map(|c| c.as_ref().map_or_else(|| "-".to_string(), &cell)),
                )
                .collect(),
        );
    }
    write_table(f, &rows)
}

fn write_stats(
    f: &mut fmt::Formatter<'_>,
    stats: &BTreeMap<YearDepartment, BurntAreaStats>,
) -> fmt::Result {
    if stats.is_empty() {
        return writeln!(f, "  (no matching incidents)");
    }

    let header = [
        "year", "department", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
    ];
    let mut rows = vec![header.iter().map(ToString::to_string).collect::<Vec<_>>()];
    for (key, s) in stats {
        rows.push(vec![
            key.year.to_string(),
            key.department.clone(),
            s.count.to_string(),
            format!("{:.3}", s.mean),
            s.std.map_or_else(|| "-".to_string(), |v| format!("{v:.3}")),
            format!("{:.3}", s.min),
            format!("{:.3}", s.p25),
            format!("{:.3}", s.p50),
            format!("{:.3}", s.p75),
            format!("{:.3}", s.max),
        ]);
    }
    write_table(f, &rows)
}

fn write_anova(f: &mut fmt::Formatter<'_>, report: &AnovaReport) -> fmt::Result {
    writeln!(
        f,
        "\nANOVA of '{}' by '{}' ({} groups, {} observations):",
        report.continuous, report.categorical, report.groups, report.observations
    )?;
    writeln!(f, "  F-statistic: {}", report.f_statistic)?;
    writeln!(f, "  p-value: {}", report.p_value)?;
    let verdict = if report.significant {
        "has a significant effect"
    } else {
        "has no significant effect"
    };
    writeln!(
        f,
        "  '{}' {verdict} on '{}' at alpha = {}",
        report.categorical, report.continuous, report.alpha
    )
}
