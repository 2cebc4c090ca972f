#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PNG charts of burnt area.
//!
//! [`plot_burnt_area`] draws one line per department across years;
//! [`pie_charts_per_year`] draws each department's share of a year's burnt
//! area, one image per year. The series behind both are computed by
//! [`burnt_area_series`] and [`department_shares`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use wildfire_ingest::IncidentTable;
use wildfire_ingest::progress::{self, ProgressCallback};

/// Placeholder replaced by the year in [`ChartOptions::pie_chart_file`].
pub const YEAR_PLACEHOLDER: &str = "{year}";

const FONT: &str = "sans-serif";

/// Errors that can occur while rendering charts.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// The output directory could not be created or an image file could not
    /// be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The drawing backend failed.
    #[error("Drawing error: {message}")]
    Drawing {
        /// Description of what went wrong.
        message: String,
    },
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing {
            message: err.to_string(),
        }
    }
}

/// File names and image sizes of the rendered charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// File name of the line chart.
    pub line_chart_file: String,
    /// File name of each pie chart; [`YEAR_PLACEHOLDER`] becomes the year.
    pub pie_chart_file: String,
    /// Line chart size in pixels.
    pub line_chart_size: (u32, u32),
    /// Pie chart size in pixels.
    pub pie_chart_size: (u32, u32),
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            line_chart_file: "Evolution_surface_brulee_par_departement.png".to_string(),
            pie_chart_file: "Surface_brulee_par_departement_en_{year}.png".to_string(),
            line_chart_size: (1000, 600),
            pie_chart_size: (800, 800),
        }
    }
}

impl ChartOptions {
    /// File name of the pie chart for `year`.
    #[must_use]
    pub fn pie_chart_file_for(&self, year: i32) -> String {
        self.pie_chart_file
            .replace(YEAR_PLACEHOLDER, &year.to_string())
    }
}

// ── Series ──────────────────────────────────────────────────────────────

/// Yearly burnt area (hectares) per department. Years without a fire in a
/// department are absent from its series.
#[must_use]
pub fn burnt_area_series(table: &IncidentTable) -> BTreeMap<String, BTreeMap<i32, f64>> {
    let mut series: BTreeMap<String, BTreeMap<i32, f64>> = BTreeMap::new();
    for record in table {
        *series
            .entry(record.department.clone())
            .or_default()
            .entry(record.year)
            .or_insert(0.0) += record.burnt_area_ha;
    }
    series
}

/// Burnt area (hectares) per department for each year, departments in
/// ascending order.
#[must_use]
pub fn department_shares(table: &IncidentTable) -> BTreeMap<i32, Vec<(String, f64)>> {
    let mut sums: BTreeMap<i32, BTreeMap<&str, f64>> = BTreeMap::new();
    for record in table {
        *sums
            .entry(record.year)
            .or_default()
            .entry(record.department.as_str())
            .or_insert(0.0) += record.burnt_area_ha;
    }

    sums.into_iter()
        .map(|(year, departments)| {
            let shares = departments
                .into_iter()
                .map(|(department, ha)| (department.to_string(), ha))
                .collect();
            (year, shares)
        })
        .collect()
}

// ── Rendering ───────────────────────────────────────────────────────────

/// Draws burnt area over years, one line per department, and returns the
/// path written.
///
/// # Errors
///
/// Returns [`ChartError::Io`] if `out_dir` cannot be created or the image
/// cannot be written, and [`ChartError::Drawing`] if rendering fails.
pub fn plot_burnt_area(
    table: &IncidentTable,
    out_dir: &Path,
    options: &ChartOptions,
) -> Result<PathBuf, ChartError> {
    let path = prepare_output(out_dir, &options.line_chart_file)?;
    let series = burnt_area_series(table);
    let years = table.years();

    render_png(&path, options.line_chart_size, |root| {
        draw_lines(root, &series, &years)
    })?;

    log::info!(
        "Wrote burnt area chart for {} departments to {}",
        series.len(),
        path.display()
    );
    Ok(path)
}

/// Draws one pie chart per year of each department's share of that year's
/// burnt area, and returns the paths written in year order.
///
/// A year whose total burnt area is zero still gets an image, carrying the
/// title and a note instead of slices.
///
/// # Errors
///
/// Returns [`ChartError::Io`] if `out_dir` cannot be created or an image
/// cannot be written, and [`ChartError::Drawing`] if rendering fails.
pub fn pie_charts_per_year(
    table: &IncidentTable,
    out_dir: &Path,
    options: &ChartOptions,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<Vec<PathBuf>, ChartError> {
    let progress = progress.unwrap_or_else(progress::null_progress);
    let shares = department_shares(table);
    progress.set_total(shares.len() as u64);

    let mut written = Vec::with_capacity(shares.len());
    for (year, departments) in &shares {
        progress.set_message(format!("Pie chart {year}"));
        let path = prepare_output(out_dir, &options.pie_chart_file_for(*year))?;

        render_png(&path, options.pie_chart_size, |root| {
            draw_pie(root, *year, departments)
        })?;

        log::debug!("Wrote {}", path.display());
        written.push(path);
        progress.inc(1);
    }

    progress.finish(format!("Wrote {} pie charts", written.len()));
    Ok(written)
}

/// Creates `out_dir` and returns the path of `file_name` inside it.
fn prepare_output(out_dir: &Path, file_name: &str) -> Result<PathBuf, ChartError> {
    std::fs::create_dir_all(out_dir)?;
    Ok(out_dir.join(file_name))
}

/// Draws into an RGB buffer, encodes it as PNG, and writes it to `path`.
fn render_png<F>(path: &Path, (width, height): (u32, u32), draw: F) -> Result<(), ChartError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), ChartError>,
{
    let mut pixels = vec![0_u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ColorType::Rgb8)
        .map_err(|e| ChartError::Drawing {
            message: format!("PNG encoding failed: {e}"),
        })?;
    std::fs::write(path, png)?;
    Ok(())
}

fn series_color(index: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(index).rgb();
    RGBColor(r, g, b)
}

fn draw_lines<DB>(
    root: &DrawingArea<DB, Shift>,
    series: &BTreeMap<String, BTreeMap<i32, f64>>,
    years: &[i32],
) -> Result<(), ChartError>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let first = years.first().copied().unwrap_or_default();
    let last = years.last().copied().unwrap_or(first).max(first + 1);
    let y_max = series
        .values()
        .flat_map(BTreeMap::values)
        .copied()
        .fold(0.0, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption("Evolution of total burnt area by department", (FONT, 28))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(first..last, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Burnt Area (ha)")
        .x_labels(years.len().clamp(2, 12))
        .x_label_formatter(&|year| year.to_string())
        .y_label_formatter(&|ha| format!("{ha:.0}"))
        .draw()?;

    for (i, (department, points)) in series.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(LineSeries::new(
                points.iter().map(|(&year, &ha)| (year, ha)),
                color.stroke_width(2),
            ))?
            .label(department.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if !series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    Ok(())
}

#[allow(clippy::cast_possible_wrap)]
fn draw_pie<DB>(
    root: &DrawingArea<DB, Shift>,
    year: i32,
    departments: &[(String, f64)],
) -> Result<(), ChartError>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;
    let area = root.titled(
        &format!("Total Burnt Area by Department for the Year {year}"),
        (FONT, 26),
    )?;

    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);

    let slices: Vec<&(String, f64)> = departments.iter().filter(|(_, ha)| *ha > 0.0).collect();
    if slices.is_empty() {
        log::warn!("No burnt area recorded in {year}; drawing an empty chart");
        area.draw(&Text::new(
            "No burnt area recorded",
            (center.0 - 110, center.1),
            (FONT, 24),
        ))?;
        return Ok(());
    }

    let sizes: Vec<f64> = slices.iter().map(|(_, ha)| *ha).collect();
    let labels: Vec<String> = slices.iter().map(|(d, _)| d.clone()).collect();
    let colors: Vec<RGBColor> = (0..slices.len()).map(series_color).collect();
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style((FONT, 20).into_font().color(&BLACK));
    pie.percentages((FONT, 16).into_font().color(&BLACK));
    area.draw(&pie)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use wildfire_ingest::{default_dataset, read_incidents};

    use super::*;

    const EXPORT: &str = "Prométhée\nExtraction\n\
Année;Numéro;Type de feu;Département;Code INSEE;Commune;Lieu-dit;Code du carreau DFCI;Alerte;Origine de l'alerte;Surface parcourue (m2)\n\
2019;1;;13;;;;;2019-07-01 12:00:00;;10000\n\
2019;2;;13;;;;;2019-07-02 12:00:00;;5000\n\
2019;3;;83;;;;;2019-07-03 12:00:00;;30000\n\
2020;4;;83;;;;;2020-08-01 12:00:00;;20000\n\
2021;5;;06;;;;;2021-08-01 12:00:00;;0\n";

    fn table() -> IncidentTable {
        read_incidents(EXPORT.as_bytes(), &default_dataset(), None)
            .unwrap()
            .0
    }

    #[test]
    fn series_sum_per_department_and_year() {
        let series = burnt_area_series(&table());

        assert_eq!(
            series.keys().collect::<Vec<_>>(),
            vec!["06", "13", "83"]
        );
        assert!((series["13"][&2019] - 1.5).abs() < 1e-9);
        assert!((series["83"][&2019] - 3.0).abs() < 1e-9);
        assert!((series["83"][&2020] - 2.0).abs() < 1e-9);
        assert!(!series["13"].contains_key(&2020));
    }

    #[test]
    fn shares_group_departments_by_year() {
        let shares = department_shares(&table());

        assert_eq!(shares.keys().copied().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
        let departments: Vec<&str> = shares[&2019].iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(departments, vec!["13", "83"]);
        assert!((shares[&2019][0].1 - 1.5).abs() < 1e-9);
        assert_eq!(shares[&2021].len(), 1);
        assert!(shares[&2021][0].1.abs() < f64::EPSILON);
    }

    #[test]
    fn pie_file_names_carry_the_year() {
        let options = ChartOptions::default();
        assert_eq!(
            options.pie_chart_file_for(2019),
            "Surface_brulee_par_departement_en_2019.png"
        );
    }

    #[test]
    fn unwritable_output_directory_is_io_error() {
        let blocker = std::env::temp_dir().join("wildfire_charts_blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = plot_burnt_area(&table(), &blocker.join("out"), &ChartOptions::default())
            .unwrap_err();
        assert!(matches!(err, ChartError::Io(_)), "{err}");

        let err = pie_charts_per_year(&table(), &blocker, &ChartOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ChartError::Io(_)), "{err}");

        std::fs::remove_file(&blocker).ok();
    }

    fn non_empty_file(path: &Path) -> bool {
        std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
    }

    #[test]
    fn renders_line_and_pie_charts() {
        let dir = std::env::temp_dir().join("wildfire_charts_render");
        std::fs::remove_dir_all(&dir).ok();
        let options = ChartOptions::default();
        let t = table();

        let line = plot_burnt_area(&t, &dir, &options).unwrap();
        assert_eq!(line, dir.join("Evolution_surface_brulee_par_departement.png"));
        assert!(non_empty_file(&line));

        let pies = pie_charts_per_year(&t, &dir, &options, None).unwrap();
        let expected: Vec<PathBuf> = [2019, 2020, 2021]
            .iter()
            .map(|year| dir.join(format!("Surface_brulee_par_departement_en_{year}.png")))
            .collect();
        assert_eq!(pies, expected);
        assert!(pies.iter().all(|p| non_empty_file(p)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_table_has_no_pie_charts() {
        let dir = std::env::temp_dir().join("wildfire_charts_empty");
        std::fs::remove_dir_all(&dir).ok();
        let t = IncidentTable::default();

        let pies = pie_charts_per_year(&t, &dir, &ChartOptions::default(), None).unwrap();
        assert!(pies.is_empty());

        let line = plot_burnt_area(&t, &dir, &ChartOptions::default()).unwrap();
        assert!(non_empty_file(&line));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unwritable_image_file_is_io_error() {
        let dir = std::env::temp_dir().join("wildfire_charts_unwritable");
        std::fs::remove_dir_all(&dir).ok();
        let options = ChartOptions::default();
        std::fs::create_dir_all(dir.join(&options.line_chart_file)).unwrap();

        let err = plot_burnt_area(&table(), &dir, &options).unwrap_err();
        assert!(matches!(err, ChartError::Io(_)), "{err}");

        std::fs::remove_dir_all(&dir).ok();
    }
}
