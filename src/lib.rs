//! Pension ALM - stochastic projection engine for pension balance sheets
//!
//! This library provides:
//! - Scenario grid ingestion and curve construction (forward/spot, FX,
//!   discount bases)
//! - Liability cashflow derivation, duration-matched proxies, and scaling
//! - Multi-basis present value with PV01/IE01 sensitivities
//! - LDI hedging attribution, overlay cashflows, and leverage
//! - Sequential asset roll-forward with contributions and outflows
//! - Percentile and leverage reporting across trials

pub mod assets;
pub mod curves;
pub mod error;
pub mod grid;
pub mod hedging;
pub mod liabilities;
pub mod reporting;
pub mod runner;
pub mod valuation;

// Re-export commonly used types
pub use curves::{AlmCurves, CurveFamily, CurveMapping, DiscountBasis};
pub use error::{AlmError, Diagnostics};
pub use grid::{GridShape, ScenarioGrid, Series};
pub use liabilities::{CashflowModel, CashflowSchedule};
pub use reporting::ReportSet;
pub use runner::{AlmRunner, RunConfig};
