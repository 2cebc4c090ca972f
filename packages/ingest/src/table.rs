//! In-memory table of normalized incidents, indexed by incident id.

use std::collections::{BTreeSet, HashMap};

use wildfire_incident_models::{FieldRef, IncidentRecord};

use crate::IngestError;

/// Normalized incidents in source order, with an `id` lookup index.
///
/// The table is read-only once built and can be shared by reference
/// between the aggregation, chart, and significance-test stages.
#[derive(Debug, Clone, Default)]
pub struct IncidentTable {
    records: Vec<IncidentRecord>,
    index: HashMap<String, usize>,
    extra_columns: Vec<String>,
}

impl IncidentTable {
    /// Builds a table from normalized records.
    ///
    /// `extra_columns` lists the pass-through source headers, in source
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Schema`] if two records share an `id`.
    pub fn from_records(
        records: Vec<IncidentRecord>,
        extra_columns: Vec<String>,
    ) -> Result<Self, IngestError> {
        let mut index = HashMap::with_capacity(records.len());

        for (pos, record) in records.iter().enumerate() {
            if let Some(first) = index.insert(record.id.clone(), pos) {
                return Err(IngestError::Schema {
                    message: format!(
                        "duplicate id '{}' at data rows {} and {}",
                        record.id,
                        first + 1,
                        pos + 1
                    ),
                });
            }
        }

        Ok(Self {
            records,
            index,
            extra_columns,
        })
    }

    /// Looks up a record by its `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IncidentRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Iterates over the records in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, IncidentRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct departments present, sorted.
    #[must_use]
    pub fn departments(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.department.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct years present, sorted.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Pass-through source headers, in source order.
    #[must_use]
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Whether `field` names a column of this table. Canonical fields are
    /// always present.
    #[must_use]
    pub fn has_field(&self, field: &FieldRef) -> bool {
        match field {
            FieldRef::Canonical(_) => true,
            FieldRef::Extra(header) => self.extra_columns.iter().any(|c| c == header),
        }
    }
}

impl<'a> IntoIterator for &'a IncidentTable {
    type Item = &'a IncidentRecord;
    type IntoIter = std::slice::Iter<'a, IncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
