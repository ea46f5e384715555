//! CSV ingestion of scenario grids and tabular inputs
//!
//! Expects the scenario grid layout produced by the economic scenario
//! generator: a `Trial` column, a `Timestep` column, then named value
//! columns. Liability cashflow schedules load from a `Year,nominal,real`
//! table.

use super::table::{ScenarioGrid, TENOR_COUNT};
use crate::error::AlmError;
use crate::liabilities::CashflowSchedule;
use std::path::Path;

/// Load a Trial/Timestep scenario grid from CSV
pub fn load_scenario_grid(path: &Path) -> Result<ScenarioGrid, AlmError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 || &headers[0] != "Trial" || &headers[1] != "Timestep" {
        return Err(AlmError::InvalidInput(format!(
            "scenario grid {} must start with Trial,Timestep columns",
            path.display()
        )));
    }
    let columns: Vec<String> = headers.iter().skip(2).map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let trial: usize = record[0].trim().parse()?;
        let timestep: usize = record[1].trim().parse()?;
        let values = record
            .iter()
            .skip(2)
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()?;
        records.push((trial, timestep, values));
    }

    let grid = ScenarioGrid::from_records(columns, &records)?;
    log::info!(
        "loaded scenario grid {}: {} trials x {} timesteps, {} columns",
        path.display(),
        grid.shape().trials,
        grid.shape().steps(),
        grid.columns().len()
    );
    Ok(grid)
}

/// Load a liability cashflow schedule from a `Year,nominal,real` CSV
///
/// Years 1..=100 must all be present; the row order does not matter.
pub fn load_cashflow_schedule(path: &Path) -> Result<CashflowSchedule, AlmError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut nominal = vec![0.0; TENOR_COUNT];
    let mut real = vec![0.0; TENOR_COUNT];
    let mut seen = vec![false; TENOR_COUNT];
    let mut rows = 0usize;

    for result in reader.records() {
        let record = result?;
        let year: usize = record[0].trim().parse()?;
        if year == 0 || year > TENOR_COUNT {
            return Err(AlmError::InvalidInput(format!(
                "cashflow schedule year {} is outside 1..={}",
                year, TENOR_COUNT
            )));
        }
        nominal[year - 1] = record[1].trim().parse()?;
        real[year - 1] = record[2].trim().parse()?;
        seen[year - 1] = true;
        rows += 1;
    }

    if seen.iter().any(|s| !s) {
        return Err(AlmError::TenorWidth {
            name: format!("cashflow schedule {}", path.display()),
            expected: TENOR_COUNT,
            actual: rows,
        });
    }

    CashflowSchedule::new(nominal, real)
}

/// Load per-basis margin vectors from a tenor-by-basis CSV
///
/// The header carries one column per basis, in basis order; each data row
/// holds the margins for one tenor, year 1 first. The column count is not
/// checked against the configured bases here; pairing the two tables is the
/// caller's job (`DiscountBasis::from_tables`).
pub fn load_margin_table(path: &Path) -> Result<Vec<Vec<f64>>, AlmError> {
    let mut reader = csv::Reader::from_path(path)?;
    let width = reader.headers()?.len();

    let mut margins = vec![Vec::new(); width];
    for result in reader.records() {
        let record = result?;
        if record.len() != width {
            return Err(AlmError::InvalidInput(format!(
                "margin table {} row has {} values, header has {} columns",
                path.display(),
                record.len(),
                width
            )));
        }
        for (column, field) in record.iter().enumerate() {
            margins[column].push(field.trim().parse()?);
        }
    }

    log::info!(
        "loaded margin table {}: {} bases x {} tenors",
        path.display(),
        width,
        margins.first().map(|m| m.len()).unwrap_or(0)
    );
    Ok(margins)
}
