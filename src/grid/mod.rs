//! Scenario grid: the Trial x Timestep tabular input and its derived shapes

mod loader;
mod table;

pub use loader::{load_cashflow_schedule, load_margin_table, load_scenario_grid};
pub use table::{Grid2D, GridShape, RawCurveTable, ScenarioGrid, Series, TenorTable, TENOR_COUNT};
