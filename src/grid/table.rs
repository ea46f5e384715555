//! Tabular primitives for the Trial x Timestep scenario grid
//!
//! Everything downstream of ingestion works on three shapes:
//! - `Series`: one value per (trial, timestep) row
//! - `TenorTable`: a fixed 100-point tenor vector per row
//! - `Grid2D`: a preallocated [timestep][trial] array for the asset
//!   roll-forward recursion
//!
//! Rows are stored trial-major (all timesteps of trial 1, then trial 2, ...),
//! matching the sort order of the scenario input. Trials are 1-based in the
//! input and 0-based everywhere inside the engine.

use crate::error::AlmError;

/// Number of tenor points on every curve (years 1..=100)
pub const TENOR_COUNT: usize = 100;

/// Dimensions of the scenario grid: T trials, timesteps 0..=H
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub trials: usize,
    pub horizon: usize,
}

impl GridShape {
    pub fn new(trials: usize, horizon: usize) -> Self {
        Self { trials, horizon }
    }

    /// Timesteps per trial (horizon + 1, timestep 0 included)
    pub fn steps(&self) -> usize {
        self.horizon + 1
    }

    /// Total row count of the complete Cartesian grid
    pub fn rows(&self) -> usize {
        self.trials * self.steps()
    }

    /// Flat row index for a (0-based trial, timestep) pair
    pub fn row(&self, trial: usize, timestep: usize) -> usize {
        debug_assert!(trial < self.trials, "trial {} out of range", trial);
        debug_assert!(timestep <= self.horizon, "timestep {} out of range", timestep);
        trial * self.steps() + timestep
    }
}

/// One scalar value per (trial, timestep)
#[derive(Debug, Clone)]
pub struct Series {
    shape: GridShape,
    values: Vec<f64>,
}

impl Series {
    pub fn zeros(shape: GridShape) -> Self {
        Self {
            shape,
            values: vec![0.0; shape.rows()],
        }
    }

    pub fn filled(shape: GridShape, value: f64) -> Self {
        Self {
            shape,
            values: vec![value; shape.rows()],
        }
    }

    /// Wrap a pre-built value vector; length must match the grid
    pub fn from_values(shape: GridShape, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), shape.rows());
        Self { shape, values }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn get(&self, trial: usize, timestep: usize) -> f64 {
        self.values[self.shape.row(trial, timestep)]
    }

    pub fn set(&mut self, trial: usize, timestep: usize, value: f64) {
        let idx = self.shape.row(trial, timestep);
        self.values[idx] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// All trial values at a single timestep
    pub fn at_timestep(&self, timestep: usize) -> Vec<f64> {
        (0..self.shape.trials)
            .map(|trial| self.get(trial, timestep))
            .collect()
    }
}

/// A 100-point tenor vector per (trial, timestep)
#[derive(Debug, Clone)]
pub struct TenorTable {
    shape: GridShape,
    values: Vec<f64>,
}

impl TenorTable {
    pub fn zeros(shape: GridShape) -> Self {
        Self {
            shape,
            values: vec![0.0; shape.rows() * TENOR_COUNT],
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn row(&self, trial: usize, timestep: usize) -> &[f64] {
        let start = self.shape.row(trial, timestep) * TENOR_COUNT;
        &self.values[start..start + TENOR_COUNT]
    }

    pub fn row_mut(&mut self, trial: usize, timestep: usize) -> &mut [f64] {
        let start = self.shape.row(trial, timestep) * TENOR_COUNT;
        &mut self.values[start..start + TENOR_COUNT]
    }
}

/// Raw curve columns extracted for one family; width is the number of
/// supplied constituent columns (tenors 1..=width), not necessarily 100
#[derive(Debug, Clone)]
pub struct RawCurveTable {
    shape: GridShape,
    width: usize,
    values: Vec<f64>,
}

impl RawCurveTable {
    pub fn new(shape: GridShape, width: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), shape.rows() * width);
        Self {
            shape,
            width,
            values,
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, trial: usize, timestep: usize) -> &[f64] {
        let start = self.shape.row(trial, timestep) * self.width;
        &self.values[start..start + self.width]
    }

    /// Single constituent column as a per-row series
    pub fn column(&self, index: usize) -> Series {
        let values = (0..self.shape.rows())
            .map(|row| self.values[row * self.width + index])
            .collect();
        Series::from_values(self.shape, values)
    }
}

/// Preallocated [timestep][trial] working array for the roll-forward
#[derive(Debug, Clone)]
pub struct Grid2D {
    shape: GridShape,
    values: Vec<f64>,
}

impl Grid2D {
    pub fn zeros(shape: GridShape) -> Self {
        Self {
            shape,
            values: vec![0.0; shape.rows()],
        }
    }

    pub fn get(&self, timestep: usize, trial: usize) -> f64 {
        self.values[timestep * self.shape.trials + trial]
    }

    pub fn set(&mut self, timestep: usize, trial: usize, value: f64) {
        self.values[timestep * self.shape.trials + trial] = value;
    }

    /// Convert back to the trial-major row layout
    pub fn to_series(&self) -> Series {
        let mut series = Series::zeros(self.shape);
        for timestep in 0..self.shape.steps() {
            for trial in 0..self.shape.trials {
                series.set(trial, timestep, self.get(timestep, trial));
            }
        }
        series
    }
}

/// The raw scenario grid: Trial/Timestep index plus named value columns
#[derive(Debug, Clone)]
pub struct ScenarioGrid {
    shape: GridShape,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl ScenarioGrid {
    /// Assemble a grid from per-row records of (1-based trial, timestep,
    /// values). Rows may arrive in any order; the result is trial-major.
    ///
    /// Fails if any (Trial, Timestep) pair is missing or duplicated, or if a
    /// record's value count disagrees with the header.
    pub fn from_records(
        columns: Vec<String>,
        records: &[(usize, usize, Vec<f64>)],
    ) -> Result<Self, AlmError> {
        if records.is_empty() {
            return Err(AlmError::InvalidInput(
                "scenario grid has no rows".to_string(),
            ));
        }

        let trials = records.iter().map(|(t, _, _)| *t).max().unwrap_or(0);
        let horizon = records.iter().map(|(_, s, _)| *s).max().unwrap_or(0);
        if trials == 0 {
            return Err(AlmError::InvalidInput(
                "scenario grid trials must be numbered from 1".to_string(),
            ));
        }
        let shape = GridShape::new(trials, horizon);

        let ncols = columns.len();
        let mut values = vec![0.0; shape.rows() * ncols];
        let mut seen = vec![false; shape.rows()];

        for (trial, timestep, row) in records {
            if *trial == 0 || *trial > trials || *timestep > horizon {
                return Err(AlmError::InvalidInput(format!(
                    "scenario row (trial {}, timestep {}) is outside the grid",
                    trial, timestep
                )));
            }
            if row.len() != ncols {
                return Err(AlmError::InvalidInput(format!(
                    "scenario row (trial {}, timestep {}) has {} values, header has {} columns",
                    trial,
                    timestep,
                    row.len(),
                    ncols
                )));
            }
            let idx = shape.row(trial - 1, *timestep);
            if seen[idx] {
                return Err(AlmError::DuplicateRow {
                    trial: *trial,
                    timestep: *timestep,
                });
            }
            seen[idx] = true;
            values[idx * ncols..(idx + 1) * ncols].copy_from_slice(row);
        }

        for trial in 0..trials {
            for timestep in 0..=horizon {
                if !seen[shape.row(trial, timestep)] {
                    return Err(AlmError::IncompleteGrid {
                        trial: trial + 1,
                        timestep,
                    });
                }
            }
        }

        Ok(Self {
            shape,
            columns,
            values,
        })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn column_index(&self, name: &str) -> Result<usize, AlmError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AlmError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Single named column as a per-row series
    pub fn series(&self, name: &str) -> Result<Series, AlmError> {
        let idx = self.column_index(name)?;
        let ncols = self.columns.len();
        let values = (0..self.shape.rows())
            .map(|row| self.values[row * ncols + idx])
            .collect();
        Ok(Series::from_values(self.shape, values))
    }

    /// Several named columns as a raw curve table, in the given order
    pub fn raw_table(&self, names: &[String]) -> Result<RawCurveTable, AlmError> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>, _>>()?;
        let ncols = self.columns.len();
        let width = indices.len();

        let mut values = Vec::with_capacity(self.shape.rows() * width);
        for row in 0..self.shape.rows() {
            for &idx in &indices {
                values.push(self.values[row * ncols + idx]);
            }
        }
        Ok(RawCurveTable::new(self.shape, width, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(trials: usize, horizon: usize) -> Vec<(usize, usize, Vec<f64>)> {
        let mut out = Vec::new();
        for trial in 1..=trials {
            for timestep in 0..=horizon {
                out.push((trial, timestep, vec![trial as f64, timestep as f64]));
            }
        }
        out
    }

    #[test]
    fn test_complete_grid_builds() {
        let grid = ScenarioGrid::from_records(
            vec!["a".to_string(), "b".to_string()],
            &records(3, 4),
        )
        .unwrap();

        assert_eq!(grid.shape(), GridShape::new(3, 4));
        let a = grid.series("a").unwrap();
        assert_eq!(a.get(2, 0), 3.0); // trial index 2 = input trial 3
        let b = grid.series("b").unwrap();
        assert_eq!(b.get(0, 4), 4.0);
    }

    #[test]
    fn test_missing_pair_is_fatal() {
        let mut rows = records(2, 2);
        rows.retain(|(t, s, _)| !(*t == 2 && *s == 1));

        let err = ScenarioGrid::from_records(vec!["a".to_string(), "b".to_string()], &rows)
            .unwrap_err();
        match err {
            AlmError::IncompleteGrid { trial, timestep } => {
                assert_eq!((trial, timestep), (2, 1));
            }
            other => panic!("expected IncompleteGrid, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_pair_is_fatal() {
        let mut rows = records(2, 1);
        rows.push((1, 0, vec![9.0, 9.0]));

        let err = ScenarioGrid::from_records(vec!["a".to_string(), "b".to_string()], &rows)
            .unwrap_err();
        assert!(matches!(err, AlmError::DuplicateRow { trial: 1, timestep: 0 }));
    }

    #[test]
    fn test_missing_column() {
        let grid =
            ScenarioGrid::from_records(vec!["a".to_string(), "b".to_string()], &records(1, 1))
                .unwrap();
        assert!(matches!(
            grid.series("z"),
            Err(AlmError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_grid2d_round_trip() {
        let shape = GridShape::new(2, 3);
        let mut grid = Grid2D::zeros(shape);
        grid.set(0, 0, 1.0);
        grid.set(3, 1, 7.0);

        let series = grid.to_series();
        assert_eq!(series.get(0, 0), 1.0);
        assert_eq!(series.get(1, 3), 7.0);
        assert_eq!(series.get(0, 3), 0.0);
    }

    #[test]
    fn test_raw_table_column_order() {
        let grid = ScenarioGrid::from_records(
            vec!["a".to_string(), "b".to_string()],
            &records(2, 1),
        )
        .unwrap();

        let table = grid
            .raw_table(&["b".to_string(), "a".to_string()])
            .unwrap();
        assert_eq!(table.width(), 2);
        // column 0 of the table is "b" (the timestep), column 1 is "a"
        assert_eq!(table.row(1, 1), &[1.0, 2.0]);
    }
}
