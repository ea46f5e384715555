//! Asset evolution: scenario returns, portfolio blending, and the
//! sequential roll-forward

mod returns;
mod rollforward;

pub use returns::{gbp_returns, growth_factors, portfolio_factors, AssetClass};
pub use rollforward::roll_forward;

use crate::hedging::HedgeRatios;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One asset-side strategy to run against the liability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetStrategy {
    pub name: String,
    pub starting_value: f64,
    pub classes: Vec<AssetClass>,
    /// Fraction of assets backing the LDI portfolio
    pub ldi_allocation: f64,
    pub hedge_ratios: HedgeRatios,
    /// Contribution paid when stepping out of each timestep, year 1 first
    #[serde(default)]
    pub contributions: Vec<f64>,
    /// Per-asset-class additive growth-factor shocks, year 1 first
    #[serde(default)]
    pub shocks: HashMap<String, Vec<f64>>,
}
