//! One-way analysis of variance across the categories of a field.

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use wildfire_analytics_models::{AnovaReport, SIGNIFICANCE_LEVEL};
use wildfire_incident_models::FieldRef;
use wildfire_ingest::IncidentTable;

use crate::AnalyticsError;
use crate::aggregate::round_to;

/// Decimal places of the reported statistic and p-value.
pub const ANOVA_DECIMALS: i32 = 4;

/// Relative size below which the within-group sum of squares counts as
/// zero.
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Tests whether the mean of `continuous` differs across the groups formed
/// by the distinct values of `categorical`.
///
/// Records missing either value are left out. The verdict compares the
/// unrounded p-value against [`SIGNIFICANCE_LEVEL`].
///
/// # Errors
///
/// Returns [`AnalyticsError::Schema`] if either field is not a column of
/// the table or `continuous` holds non-numeric values, and
/// [`AnalyticsError::Statistical`] if fewer than two groups exist, there
/// are no more observations than groups, or every value is identical.
pub fn test_anova(
    table: &IncidentTable,
    categorical: &str,
    continuous: &str,
) -> Result<AnovaReport, AnalyticsError> {
    let category_field = resolve(table, categorical)?;
    let value_field = resolve(table, continuous)?;
    if matches!(&value_field, FieldRef::Canonical(field) if !field.is_numeric()) {
        return Err(AnalyticsError::Schema {
            message: format!("field '{value_field}' is not numeric"),
        });
    }

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in table {
        let (Some(category), Some(value)) = (
            record.value(&category_field),
            record.value(&value_field),
        ) else {
            continue;
        };
        let number = value.as_f64().ok_or_else(|| AnalyticsError::Schema {
            message: format!(
                "field '{value_field}' holds non-numeric value '{value}' (id {})",
                record.id
            ),
        })?;
        groups.entry(category.to_string()).or_default().push(number);
    }

    let (f_statistic, p_value) = one_way(&groups)?;
    let observations = groups.values().map(Vec::len).sum();
    log::info!(
        "ANOVA {value_field} by {category_field}: {} groups, {observations} observations, F={f_statistic}, p={p_value}",
        groups.len()
    );

    Ok(AnovaReport {
        categorical: category_field.to_string(),
        continuous: value_field.to_string(),
        groups: groups.len(),
        observations,
        f_statistic: round_to(f_statistic, ANOVA_DECIMALS),
        p_value: round_to(p_value, ANOVA_DECIMALS),
        alpha: SIGNIFICANCE_LEVEL,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

fn resolve(table: &IncidentTable, name: &str) -> Result<FieldRef, AnalyticsError> {
    let field = FieldRef::parse(name);
    if table.has_field(&field) {
        Ok(field)
    } else {
        Err(AnalyticsError::Schema {
            message: format!("unknown field '{name}'"),
        })
    }
}

/// Returns `(F, p)` for the given groups.
#[allow(clippy::cast_precision_loss)]
fn one_way(groups: &BTreeMap<String, Vec<f64>>) -> Result<(f64, f64), AnalyticsError> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalyticsError::Statistical {
            message: format!("ANOVA needs at least two groups, found {k}"),
        });
    }
    let n: usize = groups.values().map(Vec::len).sum();
    if n <= k {
        return Err(AnalyticsError::Statistical {
            message: format!("ANOVA needs more observations than groups ({n} across {k} groups)"),
        });
    }

    let grand_mean = groups.values().flatten().sum::<f64>() / n as f64;
    let mut between = 0.0;
    let mut within = 0.0;
    for values in groups.values() {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        between += values.len() as f64 * (mean - grand_mean).powi(2);
        within += values.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    }

    let total = between + within;
    if total <= 0.0 {
        return Err(AnalyticsError::Statistical {
            message: "every observation has the same value".to_string(),
        });
    }
    if within <= total * ZERO_VARIANCE_TOLERANCE {
        return Ok((f64::INFINITY, 0.0));
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = (between / df_between) / (within / df_within);
    let distribution =
        FisherSnedecor::new(df_between, df_within).map_err(|e| AnalyticsError::Statistical {
            message: e.to_string(),
        })?;

    Ok((f, distribution.sf(f)))
}
