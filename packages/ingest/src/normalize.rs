//! Row-level normalization of raw export rows into [`IncidentRecord`]s.
//!
//! The header row is resolved once into a [`HeaderLayout`] (column
//! positions of every canonical field). Each data row is then cleaned:
//! missing commune/locality names become the unknown label and are
//! title-cased, the combined alert timestamp is split into a date and a
//! time, the alert origin is defaulted and coerced to an integer, and the
//! burnt area is converted to hectares.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime};
use csv::StringRecord;
use wildfire_incident_models::{
    IncidentField, IncidentRecord, hectares_from_square_metres, title_case,
};
use wildfire_ingest_models::DatasetConfig;

use crate::IngestError;

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    fields: HashMap<IncidentField, usize>,
    alert: usize,
    extras: Vec<(usize, String)>,
}

impl HeaderLayout {
    /// Resolves the header row against a dataset layout.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Schema`] if a required column is missing or
    /// two headers resolve to the same field.
    pub fn resolve(headers: &StringRecord, config: &DatasetConfig) -> Result<Self, IngestError> {
        let mut fields = HashMap::new();
        let mut alert = None;
        let mut extras = Vec::new();

        for (pos, raw) in headers.iter().enumerate() {
            let header = raw.trim();
            if header == config.alert.column {
                if alert.replace(pos).is_some() {
                    return Err(IngestError::Schema {
                        message: format!("column '{header}' appears more than once"),
                    });
                }
            } else if let Some(field) = config.columns.canonical(header) {
                if fields.insert(field, pos).is_some() {
                    return Err(IngestError::Schema {
                        message: format!("more than one column maps to '{field}'"),
                    });
                }
            } else if !header.is_empty() {
                extras.push((pos, header.to_string()));
            }
        }

        for field in [
            IncidentField::Id,
            IncidentField::Year,
            IncidentField::Department,
            IncidentField::BurntAreaM2,
        ] {
            if !fields.contains_key(&field) {
                return Err(IngestError::Schema {
                    message: format!("no column maps to required field '{field}'"),
                });
            }
        }

        let Some(alert) = alert else {
            return Err(IngestError::Schema {
                message: format!("missing alert column '{}'", config.alert.column),
            });
        };

        Ok(Self {
            fields,
            alert,
            extras,
        })
    }

    /// Pass-through headers, in source order.
    #[must_use]
    pub fn extra_columns(&self) -> Vec<String> {
        self.extras.iter().map(|(_, h)| h.clone()).collect()
    }

    fn cell<'r>(&self, row: &'r StringRecord, field: IncidentField) -> Option<&'r str> {
        self.fields
            .get(&field)
            .and_then(|&pos| non_empty(row.get(pos)))
    }
}

/// Which sentinel defaults were applied to a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fills {
    /// The commune was missing.
    pub commune: bool,
    /// The locality was missing.
    pub place: bool,
    /// The alert origin was missing.
    pub alert_origin: bool,
}

/// Normalizes one data row.
///
/// `line` is the 1-based line number of the row in the source file and is
/// only used in error messages.
///
/// # Errors
///
/// Returns [`IngestError::Schema`] if the row has no id or a malformed alert
/// timestamp, and [`IngestError::Parse`] if a value cannot be parsed.
pub fn normalize_row(
    row: &StringRecord,
    layout: &HeaderLayout,
    config: &DatasetConfig,
    line: u64,
) -> Result<(IncidentRecord, Fills), IngestError> {
    let mut fills = Fills::default();
    let unknown = config.defaults.unknown_label.as_str();

    let Some(id) = layout.cell(row, IncidentField::Id) else {
        return Err(IngestError::Schema {
            message: format!("line {line}: missing id"),
        });
    };

    let year = required(layout, row, IncidentField::Year, line)?;
    let year = year.parse::<i32>().map_err(|e| IngestError::Parse {
        line,
        field: IncidentField::Year.to_string(),
        message: format!("'{year}' is not an integer: {e}"),
    })?;

    let department = required(layout, row, IncidentField::Department, line)?.to_string();

    let commune = layout.cell(row, IncidentField::Commune).unwrap_or_else(|| {
        fills.commune = true;
        unknown
    });
    let place = layout.cell(row, IncidentField::Place).unwrap_or_else(|| {
        fills.place = true;
        unknown
    });

    let (date_token, time_token) = split_alert(non_empty(row.get(layout.alert)), line)?;
    let alert_date = parse_alert_date(date_token, &config.alert.date_formats, line)?;
    let alert_time = parse_alert_time(time_token, &config.alert.time_format, line)?;

    let alert_origin = match layout.cell(row, IncidentField::AlertOrigin) {
        Some(raw) => parse_alert_origin(raw, line)?,
        None => {
            fills.alert_origin = true;
            config.defaults.missing_alert_origin
        }
    };

    let burnt_area_m2 = parse_burnt_area(
        required(layout, row, IncidentField::BurntAreaM2, line)?,
        line,
    )?;

    let extra = layout
        .extras
        .iter()
        .filter_map(|(pos, header)| {
            non_empty(row.get(*pos)).map(|v| (header.clone(), v.to_string()))
        })
        .collect::<BTreeMap<_, _>>();

    let record = IncidentRecord {
        id: id.to_string(),
        year,
        department,
        commune: title_case(commune),
        place: title_case(place),
        fire_type: layout.cell(row, IncidentField::FireType).map(str::to_string),
        insee_code: layout.cell(row, IncidentField::InseeCode).map(str::to_string),
        grid_code: layout.cell(row, IncidentField::GridCode).map(str::to_string),
        alert_origin,
        alert_date,
        alert_time,
        burnt_area_m2,
        burnt_area_ha: hectares_from_square_metres(burnt_area_m2),
        extra,
    };

    Ok((record, fills))
}

fn non_empty(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

fn required<'r>(
    layout: &HeaderLayout,
    row: &'r StringRecord,
    field: IncidentField,
    line: u64,
) -> Result<&'r str, IngestError> {
    layout.cell(row, field).ok_or_else(|| IngestError::Parse {
        line,
        field: field.to_string(),
        message: "value is missing".to_string(),
    })
}

/// Splits a combined `"<date> <time>"` alert value into its two tokens.
///
/// # Errors
///
/// Returns [`IngestError::Schema`] unless the value holds exactly one date
/// token and one time token separated by whitespace.
pub fn split_alert(raw: Option<&str>, line: u64) -> Result<(&str, &str), IngestError> {
    let Some(raw) = raw else {
        return Err(IngestError::Schema {
            message: format!("line {line}: missing alert timestamp"),
        });
    };

    let mut tokens = raw.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(date), Some(time), None) => Ok((date, time)),
        _ => Err(IngestError::Schema {
            message: format!(
                "line {line}: malformed alert timestamp '{raw}', expected '<date> <time>'"
            ),
        }),
    }
}

/// Parses the date token of an alert timestamp, trying each format in turn.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] if no format matches.
pub fn parse_alert_date(
    token: &str,
    formats: &[String],
    line: u64,
) -> Result<NaiveDate, IngestError> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
        .ok_or_else(|| IngestError::Parse {
            line,
            field: IncidentField::AlertDate.to_string(),
            message: format!("'{token}' does not match any of {formats:?}"),
        })
}

/// Parses the time token of an alert timestamp.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] if the token does not match `format`.
pub fn parse_alert_time(token: &str, format: &str, line: u64) -> Result<NaiveTime, IngestError> {
    NaiveTime::parse_from_str(token, format).map_err(|e| IngestError::Parse {
        line,
        field: IncidentField::AlertTime.to_string(),
        message: format!("'{token}' does not match '{format}': {e}"),
    })
}

/// Coerces an alert origin to an integer. Integral reals such as `"3.0"`
/// are accepted.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] if the value is not an integer.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn parse_alert_origin(raw: &str, line: u64) -> Result<i64, IngestError> {
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }

    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 => Ok(v as i64),
        _ => Err(IngestError::Parse {
            line,
            field: IncidentField::AlertOrigin.to_string(),
            message: format!("'{raw}' is not an integer"),
        }),
    }
}

/// Parses a burnt area in square metres.
///
/// # Errors
///
/// Returns [`IngestError::Parse`] unless the value is a finite,
/// non-negative number.
pub fn parse_burnt_area(raw: &str, line: u64) -> Result<f64, IngestError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Ok(v) => Err(IngestError::Parse {
            line,
            field: IncidentField::BurntAreaM2.to_string(),
            message: format!("{v} is not a non-negative area"),
        }),
        Err(e) => Err(IngestError::Parse {
            line,
            field: IncidentField::BurntAreaM2.to_string(),
            message: format!("'{raw}' is not a number: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::default_dataset;

    const HEADERS: &[&str] = &[
        "Année",
        "Numéro",
        "Type de feu",
        "Département",
        "Code INSEE",
        "Commune",
        "Lieu-dit",
        "Code du carreau DFCI",
        "Alerte",
        "Origine de l'alerte",
        "Surface parcourue (m2)",
        "Nature",
    ];

    fn layout() -> HeaderLayout {
        HeaderLayout::resolve(&StringRecord::from(HEADERS.to_vec()), &default_dataset()).unwrap()
    }

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn normalizes_a_complete_row() {
        let config = default_dataset();
        let (record, fills) = normalize_row(
            &row(&[
                "2019",
                "19-0042",
                "Forêt",
                "13",
                "13055",
                "MARSEILLE",
                "les goudes",
                "KD48C6",
                "2019-07-14 13:05:00",
                "3",
                "25000",
                "Broussailles",
            ]),
            &layout(),
            &config,
            4,
        )
        .unwrap();

        assert_eq!(record.id, "19-0042");
        assert_eq!(record.year, 2019);
        assert_eq!(record.department, "13");
        assert_eq!(record.commune, "Marseille");
        assert_eq!(record.place, "Les Goudes");
        assert_eq!(record.fire_type.as_deref(), Some("Forêt"));
        assert_eq!(record.grid_code.as_deref(), Some("KD48C6"));
        assert_eq!(record.alert_origin, 3);
        assert_eq!(record.alert_date, NaiveDate::from_ymd_opt(2019, 7, 14).unwrap());
        assert_eq!(record.alert_time, NaiveTime::from_hms_opt(13, 5, 0).unwrap());
        assert!((record.burnt_area_ha - 2.5).abs() < f64::EPSILON);
        assert_eq!(record.extra.get("Nature").map(String::as_str), Some("Broussailles"));
        assert_eq!(fills, Fills::default());
    }

    #[test]
    fn fills_missing_place_and_alert_origin() {
        let config = default_dataset();
        let (record, fills) = normalize_row(
            &row(&[
                "2020", "7", "", "83", "", "", "", "", "2020-08-01 09:30:00", "", "500", "",
            ]),
            &layout(),
            &config,
            5,
        )
        .unwrap();

        assert_eq!(record.place, "Unknown");
        assert_eq!(record.commune, "Unknown");
        assert_eq!(record.alert_origin, 0);
        assert_eq!(record.fire_type, None);
        assert!(record.extra.is_empty());
        assert!(fills.place && fills.commune && fills.alert_origin);
    }

    #[test]
    fn missing_trailing_cells_count_as_missing() {
        let config = default_dataset();
        let (record, _) = normalize_row(
            &row(&[
                "2020", "8", "", "83", "", "Hyères", "", "", "2020-08-01 09:30:00", "", "500",
            ]),
            &layout(),
            &config,
            6,
        )
        .unwrap();

        assert_eq!(record.commune, "Hyères");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn rejects_alert_without_time_token() {
        let err = split_alert(Some("2020-08-01"), 9).unwrap_err();
        assert!(matches!(err, IngestError::Schema { .. }));
        assert!(err.to_string().contains("line 9"), "{err}");
    }

    #[test]
    fn rejects_alert_with_extra_tokens() {
        let err = split_alert(Some("2020-08-01 09:30:00 UTC"), 9).unwrap_err();
        assert!(matches!(err, IngestError::Schema { .. }));
    }

    #[test]
    fn rejects_missing_alert() {
        assert!(matches!(
            split_alert(None, 3),
            Err(IngestError::Schema { .. })
        ));
    }

    #[test]
    fn splits_on_any_whitespace() {
        assert_eq!(
            split_alert(Some("2020-08-01\t09:30:00"), 1).unwrap(),
            ("2020-08-01", "09:30:00")
        );
    }

    #[test]
    fn parses_day_first_dates() {
        let formats = default_dataset().alert.date_formats;
        assert_eq!(
            parse_alert_date("14/07/2019", &formats, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 7, 14).unwrap()
        );
        assert!(matches!(
            parse_alert_date("2019-13-45", &formats, 1),
            Err(IngestError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_bad_times() {
        assert!(matches!(
            parse_alert_time("25:00:00", "%H:%M:%S", 1),
            Err(IngestError::Parse { .. })
        ));
        assert!(matches!(
            parse_alert_time("13h05", "%H:%M:%S", 1),
            Err(IngestError::Parse { .. })
        ));
    }

    #[test]
    fn coerces_alert_origin() {
        assert_eq!(parse_alert_origin("3", 1).unwrap(), 3);
        assert_eq!(parse_alert_origin("3.0", 1).unwrap(), 3);
        assert!(matches!(
            parse_alert_origin("3.5", 1),
            Err(IngestError::Parse { .. })
        ));
        assert!(matches!(
            parse_alert_origin("vigie", 1),
            Err(IngestError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_negative_or_non_numeric_area() {
        assert!(matches!(
            parse_burnt_area("-1", 1),
            Err(IngestError::Parse { .. })
        ));
        assert!(matches!(
            parse_burnt_area("beaucoup", 1),
            Err(IngestError::Parse { .. })
        ));
        assert!((parse_burnt_area("12.5", 1).unwrap() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_missing_id_as_schema_error() {
        let config = default_dataset();
        let err = normalize_row(
            &row(&["2020", "", "", "83", "", "", "", "", "2020-08-01 09:30:00", "", "500", ""]),
            &layout(),
            &config,
            7,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Schema { .. }));
    }

    #[test]
    fn reports_bad_year_with_line_and_field() {
        let config = default_dataset();
        let err = normalize_row(
            &row(&["20x0", "1", "", "83", "", "", "", "", "2020-08-01 09:30:00", "", "500", ""]),
            &layout(),
            &config,
            12,
        )
        .unwrap_err();
        let IngestError::Parse { line, field, .. } = err else {
            panic!("expected parse error, got {err}");
        };
        assert_eq!(line, 12);
        assert_eq!(field, "year");
    }

    #[test]
    fn header_layout_requires_key_columns() {
        let headers = StringRecord::from(vec!["Année", "Département", "Alerte"]);
        let err = HeaderLayout::resolve(&headers, &default_dataset()).unwrap_err();
        assert!(matches!(err, IngestError::Schema { .. }));
    }

    #[test]
    fn header_layout_requires_alert_column() {
        let headers = StringRecord::from(vec![
            "Année",
            "Numéro",
            "Département",
            "Surface parcourue (m2)",
        ]);
        let err = HeaderLayout::resolve(&headers, &default_dataset()).unwrap_err();
        assert!(err.to_string().contains("Alerte"), "{err}");
    }

    #[test]
    fn header_layout_keeps_unmapped_columns() {
        assert_eq!(layout().extra_columns(), vec!["Nature".to_string()]);
    }
}
