#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation keys, result types, and significance-test reports.
//!
//! Aggregations are keyed by [`YearDepartment`] and returned as ordered
//! maps. [`Pivot`] lays such a map out as a year × department grid for
//! display, and [`GroupValue`] flattens it into rows for JSON output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Significance threshold (α) of the ANOVA verdict.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Grouping key of every aggregation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDepartment {
    /// Year of the fires.
    pub year: i32,
    /// Department of the fires.
    pub department: String,
}

impl YearDepartment {
    /// Creates a key.
    #[must_use]
    pub fn new(year: i32, department: impl Into<String>) -> Self {
        Self {
            year,
            department: department.into(),
        }
    }
}

/// Which records an aggregation considers.
///
/// A record matches when its year is one of `years` and, if a department
/// set is given, its department is one of `departments`. No department set
/// (or an empty one) means every department present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentFilter {
    /// Years to keep.
    pub years: BTreeSet<i32>,
    /// Departments to keep; `None` keeps all.
    pub departments: Option<BTreeSet<String>>,
}

impl IncidentFilter {
    /// Builds a filter. An empty department list is the same as none.
    #[must_use]
    pub fn new<S: AsRef<str>>(years: &[i32], departments: Option<&[S]>) -> Self {
        let departments = departments
            .filter(|d| !d.is_empty())
            .map(|d| d.iter().map(|s| s.as_ref().trim().to_string()).collect());

        Self {
            years: years.iter().copied().collect(),
            departments,
        }
    }

    /// Whether a record with this year and department is kept.
    #[must_use]
    pub fn matches(&self, year: i32, department: &str) -> bool {
        self.years.contains(&year)
            && self
                .departments
                .as_ref()
                .is_none_or(|d| d.contains(department))
    }
}

/// Descriptive statistics of burnt area (hectares) for one group.
///
/// All values are rounded to 3 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurntAreaStats {
    /// Number of fires.
    pub count: u64,
    /// Mean burnt area.
    pub mean: f64,
    /// Sample standard deviation; `None` for a single fire.
    pub std: Option<f64>,
    /// Smallest burnt area.
    pub min: f64,
    /// First quartile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// Third quartile.
    pub p75: f64,
    /// Largest burnt area.
    pub max: f64,
}

/// Result of a one-way ANOVA of a continuous field across the groups of a
/// categorical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnovaReport {
    /// Field that partitions the records.
    pub categorical: String,
    /// Field whose means are compared.
    pub continuous: String,
    /// Number of groups.
    pub groups: usize,
    /// Number of observations across all groups.
    pub observations: usize,
    /// F-statistic, rounded to 4 decimal places.
    pub f_statistic: f64,
    /// p-value, rounded to 4 decimal places.
    pub p_value: f64,
    /// Threshold the p-value is compared against.
    pub alpha: f64,
    /// Whether the unrounded p-value is below `alpha`.
    pub significant: bool,
}

/// One cell of an aggregation, flattened for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupValue<T> {
    /// Year of the group.
    pub year: i32,
    /// Department of the group.
    pub department: String,
    /// Aggregated value.
    pub value: T,
}

/// Flattens an aggregation into rows ordered by year then department.
#[must_use]
pub fn group_values<T: Clone>(map: &BTreeMap<YearDepartment, T>) -> Vec<GroupValue<T>> {
    map.iter()
        .map(|(key, value)| GroupValue {
            year: key.year,
            department: key.department.clone(),
            value: value.clone(),
        })
        .collect()
}

/// An aggregation laid out as a grid: one row per year, one column per
/// department. Cells for pairs absent from the data are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pivot<T> {
    /// Row labels.
    pub years: Vec<i32>,
    /// Column labels.
    pub departments: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<Option<T>>>,
}

impl<T: Clone> Pivot<T> {
    /// Lays out an aggregation as a grid.
    #[must_use]
    pub fn from_map(map: &BTreeMap<YearDepartment, T>) -> Self {
        let years: Vec<i32> = map
            .keys()
            .map(|k| k.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let departments: Vec<String> = map
            .keys()
            .map(|k| k.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let cells = years
            .iter()
            .map(|&year| {
                departments
                    .iter()
                    .map(|department| {
                        map.get(&YearDepartment::new(year, department.as_str()))
                            .cloned()
                    })
                    .collect()
            })
            .collect();

        Self {
            years,
            departments,
            cells,
        }
    }
}

impl<T> Pivot<T> {
    /// Whether the grid has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_by_year_then_department() {
        let mut keys = vec![
            YearDepartment::new(2020, "13"),
            YearDepartment::new(2019, "83"),
            YearDepartment::new(2020, "06"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                YearDepartment::new(2019, "83"),
                YearDepartment::new(2020, "06"),
                YearDepartment::new(2020, "13"),
            ]
        );
    }

    #[test]
    fn filter_without_departments_keeps_all_departments() {
        let filter = IncidentFilter::new::<&str>(&[2019], None);
        assert!(filter.matches(2019, "13"));
        assert!(filter.matches(2019, "2A"));
        assert!(!filter.matches(2020, "13"));
    }

    #[test]
    fn empty_department_list_is_no_filter() {
        let filter = IncidentFilter::new::<&str>(&[2019], Some(&[][..]));
        assert_eq!(filter.departments, None);
        assert!(filter.matches(2019, "84"));
    }

    #[test]
    fn filter_with_departments_restricts() {
        let filter = IncidentFilter::new(&[2019, 2020], Some(&["13", " 83"][..]));
        assert!(filter.matches(2020, "83"));
        assert!(!filter.matches(2020, "06"));
    }

    #[test]
    fn pivots_absent_pairs_to_empty_cells() {
        let map = BTreeMap::from([
            (YearDepartment::new(2019, "13"), 4_u64),
            (YearDepartment::new(2020, "83"), 1),
        ]);
        let pivot = Pivot::from_map(&map);

        assert_eq!(pivot.years, vec![2019, 2020]);
        assert_eq!(pivot.departments, vec!["13".to_string(), "83".to_string()]);
        assert_eq!(pivot.cells, vec![vec![Some(4), None], vec![None, Some(1)]]);
    }

    #[test]
    fn pivot_of_empty_map_is_empty() {
        let map: BTreeMap<YearDepartment, f64> = BTreeMap::new();
        let pivot = Pivot::from_map(&map);

        assert!(pivot.is_empty());
        assert!(pivot.departments.is_empty());
    }

    #[test]
    fn flattens_groups_in_key_order() {
        let map = BTreeMap::from([
            (YearDepartment::new(2020, "83"), 1.5_f64),
            (YearDepartment::new(2019, "13"), 0.25),
        ]);
        let rows = group_values(&map);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2019);
        assert_eq!(rows[0].department, "13");
        assert!((rows[1].value - 1.5).abs() < f64::EPSILON);
    }
}
