//! Output aggregation: the simulation frame, percentile summaries, and CSV
//! report tables

use crate::error::Diagnostics;
use crate::grid::{GridShape, Series};
use std::collections::BTreeMap;
use std::path::Path;

/// Default report quantiles, matching the historical output layout
pub const DEFAULT_QUANTILES: [f64; 9] = [0.005, 0.01, 0.05, 0.25, 0.5, 0.75, 0.95, 0.99, 0.995];

/// Named per-(trial, timestep) result columns, in insertion order
#[derive(Debug, Clone)]
pub struct SimulationFrame {
    shape: GridShape,
    names: Vec<String>,
    columns: Vec<Series>,
}

impl SimulationFrame {
    pub fn new(shape: GridShape) -> Self {
        Self {
            shape,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn insert(&mut self, name: impl Into<String>, series: Series) {
        debug_assert_eq!(series.shape(), self.shape);
        self.names.push(name.into());
        self.columns.push(series);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }
}

/// Funding level per row: asset / PV, with a zero PV reported as NaN and a
/// diagnostic rather than a signed infinity
pub fn funding_levels(
    assets: &Series,
    pv: &Series,
    basis_name: &str,
    diags: &mut Diagnostics,
) -> Series {
    let shape = assets.shape();
    let mut levels = Series::zeros(shape);
    let mut zero_rows = 0usize;

    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let liability = pv.get(trial, timestep);
            let level = if liability == 0.0 {
                zero_rows += 1;
                f64::NAN
            } else {
                assets.get(trial, timestep) / liability
            };
            levels.set(trial, timestep, level);
        }
    }

    if zero_rows > 0 {
        diags.push(format!(
            "funding level undefined on basis '{}': liability PV is zero on {} grid rows",
            basis_name, zero_rows
        ));
    }
    levels
}

/// Linearly interpolated quantile over the finite values of a sample
///
/// NaN entries are dropped before ranking; an all-NaN sample yields NaN.
pub fn quantile(sample: &[f64], q: f64) -> f64 {
    let mut finite: Vec<f64> = sample.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let position = q * (finite.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return finite[lower];
    }
    let weight = position - lower as f64;
    finite[lower] * (1.0 - weight) + finite[upper] * weight
}

/// One rectangular report table, written as labeled CSV
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub row_labels: Vec<String>,
    pub columns: Vec<String>,
    /// Row-major values, one inner vector per row label
    pub values: Vec<Vec<f64>>,
}

impl ReportTable {
    /// Write as CSV with a leading label column; NaN cells are left empty
    pub fn write_csv(&self, path: &Path) -> Result<(), std::io::Error> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (label, row) in self.row_labels.iter().zip(&self.values) {
            let mut record = vec![label.clone()];
            record.extend(row.iter().map(|v| {
                if v.is_nan() {
                    String::new()
                } else {
                    v.to_string()
                }
            }));
            writer.write_record(&record)?;
        }
        writer.flush()
    }
}

/// Percentile summary of every frame column at the requested timesteps
///
/// Rows are labeled "Y{timestep} {quantile} Percentile"; timesteps past the
/// projection horizon are skipped.
pub fn percentile_table(
    frame: &SimulationFrame,
    quantiles: &[f64],
    timesteps: &[usize],
) -> ReportTable {
    let mut row_labels = Vec::new();
    let mut values = Vec::new();

    for &timestep in timesteps {
        if timestep > frame.shape().horizon {
            continue;
        }
        let samples: Vec<Vec<f64>> = frame
            .columns
            .iter()
            .map(|col| col.at_timestep(timestep))
            .collect();
        for &q in quantiles {
            row_labels.push(format!("Y{} {} Percentile", timestep, q));
            values.push(samples.iter().map(|s| quantile(s, q)).collect());
        }
    }

    ReportTable {
        row_labels,
        columns: frame.names.clone(),
        values,
    }
}

/// Full per-row dump of a frame: one row per (trial, timestep), labeled
/// "T{trial} Y{timestep}" with 1-based trials, in grid order
pub fn frame_table(frame: &SimulationFrame) -> ReportTable {
    let shape = frame.shape();
    let mut row_labels = Vec::with_capacity(shape.rows());
    let mut values = Vec::with_capacity(shape.rows());

    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            row_labels.push(format!("T{} Y{}", trial + 1, timestep));
            values.push(
                frame
                    .columns
                    .iter()
                    .map(|col| col.get(trial, timestep))
                    .collect(),
            );
        }
    }

    ReportTable {
        row_labels,
        columns: frame.names.clone(),
        values,
    }
}

/// Single-row day-0 snapshot of selected frame columns (first trial)
pub fn snapshot_table(frame: &SimulationFrame, names: &[String]) -> ReportTable {
    let row = names
        .iter()
        .map(|name| {
            frame
                .column(name)
                .map(|col| col.get(0, 0))
                .unwrap_or(f64::NAN)
        })
        .collect();

    ReportTable {
        row_labels: vec!["Y0".to_string()],
        columns: names.to_vec(),
        values: vec![row],
    }
}

/// Named report tables for one run
#[derive(Debug, Clone, Default)]
pub struct ReportSet {
    tables: BTreeMap<String, ReportTable>,
}

impl ReportSet {
    pub fn insert(&mut self, name: impl Into<String>, table: ReportTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&ReportTable> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn merge(&mut self, other: ReportSet) {
        self.tables.extend(other.tables);
    }

    /// Write every table as "<sanitized name>.csv" under the directory
    pub fn write_all(&self, dir: &Path) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(dir)?;
        for (name, table) in &self.tables {
            let file = format!("{}.csv", sanitize_file_name(name));
            table.write_csv(&dir.join(file))?;
        }
        Ok(())
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_interpolates_between_ranks() {
        assert_relative_eq!(quantile(&[10.0, 20.0], 0.5), 15.0, max_relative = 1e-12);
        assert_relative_eq!(
            quantile(&[1.0, 2.0, 3.0, 4.0], 0.25),
            1.75,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_quantile_endpoints() {
        let sample = [3.0, 1.0, 2.0];
        assert_eq!(quantile(&sample, 0.0), 1.0);
        assert_eq!(quantile(&sample, 1.0), 3.0);
    }

    #[test]
    fn test_quantile_skips_nan() {
        let sample = [f64::NAN, 10.0, 20.0, f64::NAN];
        assert_relative_eq!(quantile(&sample, 0.5), 15.0, max_relative = 1e-12);
        assert!(quantile(&[f64::NAN], 0.5).is_nan());
    }

    #[test]
    fn test_funding_level_zero_pv_is_nan_with_diagnostic() {
        let shape = GridShape::new(1, 1);
        let assets = Series::filled(shape, 100.0);
        let mut pv = Series::filled(shape, 200.0);
        pv.set(0, 1, 0.0);

        let mut diags = Diagnostics::new();
        let levels = funding_levels(&assets, &pv, "gilts", &mut diags);

        assert_relative_eq!(levels.get(0, 0), 0.5, max_relative = 1e-12);
        assert!(levels.get(0, 1).is_nan());
        assert_eq!(diags.len(), 1);
        assert!(diags.messages()[0].contains("gilts"));
    }

    #[test]
    fn test_percentile_table_labels_and_values() {
        let shape = GridShape::new(2, 1);
        let mut frame = SimulationFrame::new(shape);
        let mut series = Series::zeros(shape);
        series.set(0, 0, 10.0);
        series.set(1, 0, 20.0);
        series.set(0, 1, 30.0);
        series.set(1, 1, 50.0);
        frame.insert("Assets", series);

        let table = percentile_table(&frame, &[0.5], &[0, 1, 7]);

        // timestep 7 is past the horizon and skipped
        assert_eq!(
            table.row_labels,
            vec!["Y0 0.5 Percentile", "Y1 0.5 Percentile"]
        );
        assert_eq!(table.columns, vec!["Assets"]);
        assert_relative_eq!(table.values[0][0], 15.0, max_relative = 1e-12);
        assert_relative_eq!(table.values[1][0], 40.0, max_relative = 1e-12);
    }

    #[test]
    fn test_frame_table_keeps_every_grid_row() {
        let shape = GridShape::new(2, 1);
        let mut frame = SimulationFrame::new(shape);
        let mut series = Series::zeros(shape);
        series.set(0, 0, 1.0);
        series.set(1, 1, 4.0);
        frame.insert("Leverage gilts", series);

        let table = frame_table(&frame);

        assert_eq!(table.row_labels, vec!["T1 Y0", "T1 Y1", "T2 Y0", "T2 Y1"]);
        assert_eq!(table.values[0], vec![1.0]);
        assert_eq!(table.values[3], vec![4.0]);
    }

    #[test]
    fn test_snapshot_reads_first_trial_day_zero() {
        let shape = GridShape::new(2, 1);
        let mut frame = SimulationFrame::new(shape);
        let mut series = Series::zeros(shape);
        series.set(0, 0, 250.0);
        frame.insert("Liabilities gilts", series);

        let table = snapshot_table(&frame, &["Liabilities gilts".to_string()]);
        assert_eq!(table.values, vec![vec![250.0]]);
        assert_eq!(table.row_labels, vec!["Y0"]);
    }

    #[test]
    fn test_report_csv_round_trip() {
        let table = ReportTable {
            row_labels: vec!["Y0 0.5 Percentile".to_string()],
            columns: vec!["Assets".to_string(), "Surplus gilts".to_string()],
            values: vec![vec![260.0, f64::NAN]],
        };

        let dir = std::env::temp_dir().join("alm_report_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("percentiles.csv");
        table.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), ",Assets,Surplus gilts");
        assert_eq!(lines.next().unwrap(), "Y0 0.5 Percentile,260,");
    }
}
