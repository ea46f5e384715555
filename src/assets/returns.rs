//! Asset-class returns and the blended portfolio growth factor

use crate::curves::{Currency, FxFactors};
use crate::error::AlmError;
use crate::grid::{ScenarioGrid, Series};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One non-hedging asset class: a scenario index column, its base currency,
/// and its static allocation weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetClass {
    pub name: String,
    /// Scenario grid column holding the total-return index level
    pub column: String,
    #[serde(default)]
    pub currency: Currency,
    pub allocation: f64,
}

/// Year-on-year growth factors for one index level column
///
/// factor_t = level_t / level_{t-1}, with timestep 0 defined as 1. An
/// optional per-projection-year shock is added to the factor (year 1 shocks
/// timestep 1); a shock vector shorter than the horizon pads with zero.
pub fn growth_factors(
    grid: &ScenarioGrid,
    class: &AssetClass,
    shocks: &HashMap<String, Vec<f64>>,
) -> Result<Series, AlmError> {
    let levels = grid.series(&class.column)?;
    let shape = levels.shape();
    let class_shocks = shocks.get(&class.name);

    let mut factors = Series::zeros(shape);
    for trial in 0..shape.trials {
        factors.set(trial, 0, 1.0);
        for timestep in 1..shape.steps() {
            let prev = levels.get(trial, timestep - 1);
            let curr = levels.get(trial, timestep);
            let shock = class_shocks
                .and_then(|s| s.get(timestep - 1))
                .copied()
                .unwrap_or(0.0);
            factors.set(trial, timestep, curr / prev + shock);
        }
    }
    Ok(factors)
}

/// GBP-denominated return: growth factor times the FX factor, minus 1
pub fn gbp_returns(
    factors: &Series,
    fx: &FxFactors,
    currency: Currency,
) -> Result<Series, AlmError> {
    let shape = factors.shape();
    let mut returns = Series::zeros(shape);
    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let fx_factor = fx.factor(currency, trial, timestep)?;
            returns.set(
                trial,
                timestep,
                factors.get(trial, timestep) * fx_factor - 1.0,
            );
        }
    }
    Ok(returns)
}

/// Blended portfolio growth factor, aligned to the departing timestep
///
/// The blend at timestep t is the allocation-weighted sum of GBP returns
/// plus 1. Returns realized over year t+1 grow the assets held at t, so the
/// result is the blend shifted back one step, with the terminal timestep
/// pinned to 1 (no growth beyond the horizon).
pub fn portfolio_factors(
    grid: &ScenarioGrid,
    fx: &FxFactors,
    classes: &[AssetClass],
    shocks: &HashMap<String, Vec<f64>>,
) -> Result<Series, AlmError> {
    let shape = grid.shape();
    let mut blend = Series::filled(shape, 1.0);

    for class in classes {
        let factors = growth_factors(grid, class, shocks)?;
        let returns = gbp_returns(&factors, fx, class.currency)?;
        for trial in 0..shape.trials {
            for timestep in 0..shape.steps() {
                let value = blend.get(trial, timestep)
                    + class.allocation * returns.get(trial, timestep);
                blend.set(trial, timestep, value);
            }
        }
    }

    let mut shifted = Series::zeros(shape);
    for trial in 0..shape.trials {
        for timestep in 0..shape.horizon {
            shifted.set(trial, timestep, blend.get(trial, timestep + 1));
        }
        shifted.set(trial, shape.horizon, 1.0);
    }
    Ok(shifted)
}
