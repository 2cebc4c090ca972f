#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wildfire incident record types and canonical field names.
//!
//! Every row of a fire-record export is normalized into an
//! [`IncidentRecord`]. Fields are addressed generically through
//! [`IncidentField`] (canonical snake-case names) or [`FieldRef`] (canonical
//! name or pass-through source column), which is what the significance
//! tester uses to pick its categorical and continuous variables.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr as _;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Label used for a missing commune or place name.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Alert origin code used when the source leaves the field empty. The
/// source never uses `0` as a real code.
pub const MISSING_ALERT_ORIGIN: i64 = 0;

/// Number of square metres in one hectare.
pub const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// Converts a burnt area in square metres to hectares.
#[must_use]
pub fn hectares_from_square_metres(square_metres: f64) -> f64 {
    square_metres / SQUARE_METRES_PER_HECTARE
}

/// Canonical names of the normalized incident fields.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IncidentField {
    /// Source-provided unique identifier.
    Id,
    /// Year of the fire.
    Year,
    /// Department code or name.
    Department,
    /// Commune name (title-cased, never empty).
    Commune,
    /// Locality name (title-cased, never empty).
    Place,
    /// Type of fire.
    FireType,
    /// INSEE commune code.
    InseeCode,
    /// DFCI grid square code.
    GridCode,
    /// Integer code of the alert origin.
    AlertOrigin,
    /// Calendar date of the alert.
    AlertDate,
    /// Time of day of the alert.
    AlertTime,
    /// Burnt area in square metres.
    #[serde(rename = "burnt_area_m2")]
    #[strum(to_string = "burnt_area_m2")]
    BurntAreaM2,
    /// Burnt area in hectares.
    #[serde(rename = "burnt_area_ha")]
    #[strum(to_string = "burnt_area_ha")]
    BurntAreaHa,
}

impl IncidentField {
    /// Whether values of this field are numeric and can feed a continuous
    /// analysis.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Year | Self::AlertOrigin | Self::BurntAreaM2 | Self::BurntAreaHa
        )
    }
}

/// Reference to a field of a normalized record: either one of the canonical
/// fields or a source column that passed through normalization untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    /// A canonical field.
    Canonical(IncidentField),
    /// A pass-through column, keyed by its source header.
    Extra(String),
}

impl FieldRef {
    /// Resolves a user-supplied field name. Canonical names are matched
    /// case-insensitively; anything else is treated as a pass-through
    /// column header.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        IncidentField::from_str(trimmed)
            .map_or_else(|_| Self::Extra(trimmed.to_string()), Self::Canonical)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(field) => write!(f, "{field}"),
            Self::Extra(header) => write!(f, "{header}"),
        }
    }
}

/// A single value read from a normalized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text or an opaque code.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Real value.
    Real(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
}

impl FieldValue {
    /// Numeric view of the value. Text is parsed as a real so that numeric
    /// pass-through columns can still be analyzed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Date(_) | Self::Time(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// One wildfire incident after normalization.
///
/// Records are built once by the normalizer and never mutated afterwards.
/// `burnt_area_ha` is always `burnt_area_m2 / 10_000`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Source-provided identifier, unique within a table.
    pub id: String,
    /// Year of the fire.
    pub year: i32,
    /// Department code or name (e.g. `"13"`, `"2A"`).
    pub department: String,
    /// Commune name, [`UNKNOWN_LABEL`] when missing.
    pub commune: String,
    /// Locality name, [`UNKNOWN_LABEL`] when missing.
    pub place: String,
    /// Type of fire, passed through unchanged.
    pub fire_type: Option<String>,
    /// INSEE commune code, passed through unchanged.
    pub insee_code: Option<String>,
    /// DFCI grid square code, passed through unchanged.
    pub grid_code: Option<String>,
    /// Alert origin code, [`MISSING_ALERT_ORIGIN`] when missing.
    pub alert_origin: i64,
    /// Date part of the alert timestamp.
    pub alert_date: NaiveDate,
    /// Time part of the alert timestamp.
    pub alert_time: NaiveTime,
    /// Burnt area in square metres, as recorded.
    pub burnt_area_m2: f64,
    /// Burnt area in hectares.
    pub burnt_area_ha: f64,
    /// Source columns with no canonical counterpart, keyed by header.
    /// Empty cells are omitted.
    pub extra: BTreeMap<String, String>,
}

impl IncidentRecord {
    /// Returns the value of a canonical field, or `None` when an optional
    /// pass-through field is missing.
    #[must_use]
    pub fn field(&self, field: IncidentField) -> Option<FieldValue> {
        Some(match field {
            IncidentField::Id => FieldValue::Text(self.id.clone()),
            IncidentField::Year => FieldValue::Integer(i64::from(self.year)),
            IncidentField::Department => FieldValue::Text(self.department.clone()),
            IncidentField::Commune => FieldValue::Text(self.commune.clone()),
            IncidentField::Place => FieldValue::Text(self.place.clone()),
            IncidentField::FireType => FieldValue::Text(self.fire_type.clone()?),
            IncidentField::InseeCode => FieldValue::Text(self.insee_code.clone()?),
            IncidentField::GridCode => FieldValue::Text(self.grid_code.clone()?),
            IncidentField::AlertOrigin => FieldValue::Integer(self.alert_origin),
            IncidentField::AlertDate => FieldValue::Date(self.alert_date),
            IncidentField::AlertTime => FieldValue::Time(self.alert_time),
            IncidentField::BurntAreaM2 => FieldValue::Real(self.burnt_area_m2),
            IncidentField::BurntAreaHa => FieldValue::Real(self.burnt_area_ha),
        })
    }

    /// Returns the value behind a [`FieldRef`], or `None` when missing.
    #[must_use]
    pub fn value(&self, field: &FieldRef) -> Option<FieldValue> {
        match field {
            FieldRef::Canonical(field) => self.field(*field),
            FieldRef::Extra(header) => self.extra.get(header).cloned().map(FieldValue::Text),
        }
    }
}

/// Title-cases a name: the first letter of every alphabetic run is
/// upper-cased and the remaining letters are lower-cased.
///
/// `"saint-martin D'ARDECHE"` becomes `"Saint-Martin D'Ardeche"`. The
/// transformation is idempotent.
#[must_use]
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}
