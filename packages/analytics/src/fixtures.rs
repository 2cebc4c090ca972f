//! Small in-memory exports for tests.

use wildfire_ingest::{IncidentTable, default_dataset, read_incidents};

const PREAMBLE: &str = "Prométhée\nExtraction\nAnnée;Numéro;Type de feu;Département;Code INSEE;Commune;Lieu-dit;Code du carreau DFCI;Alerte;Origine de l'alerte;Surface parcourue (m2)\n";

/// One fixture row: `(year, department, burnt_area_m2, fire_type)`.
pub type Row<'a> = (i32, &'a str, f64, &'a str);

/// Builds a table from rows; ids are assigned in order.
pub fn table(rows: &[Row<'_>]) -> IncidentTable {
    let mut text = String::from(PREAMBLE);
    for (i, (year, department, m2, fire_type)) in rows.iter().enumerate() {
        text.push_str(&format!(
            "{year};{i};{fire_type};{department};;;;;{year}-07-01 12:00:00;;{m2}\n"
        ));
    }
    read_incidents(text.as_bytes(), &default_dataset(), None)
        .unwrap()
        .0
}
