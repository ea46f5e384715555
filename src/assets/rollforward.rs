//! Sequential asset roll-forward
//!
//! The only stage of the pipeline with an enforced ordering: the asset value
//! at timestep t+1 depends on the value at t. Trials are independent, so the
//! recursion runs in parallel across trials.

use crate::grid::{Grid2D, Series};
use rayon::prelude::*;

/// Roll assets forward per trial
///
/// asset(trial, 0) = starting_value for every trial. Stepping t -> t+1:
/// asset_{t+1} = asset_t * factor_t - realized_{t+1} + overlay_{t+1}
///             + contribution(t)
/// where contribution(t) reads the vector at the departing timestep and pads
/// with zero past its end.
pub fn roll_forward(
    starting_value: f64,
    portfolio_factors: &Series,
    realized: &Series,
    overlay: &Series,
    contributions: &[f64],
) -> Series {
    let shape = portfolio_factors.shape();

    let paths: Vec<Vec<f64>> = (0..shape.trials)
        .into_par_iter()
        .map(|trial| {
            let mut path = Vec::with_capacity(shape.steps());
            path.push(starting_value);
            for timestep in 0..shape.horizon {
                let current = path[timestep];
                let next = current * portfolio_factors.get(trial, timestep)
                    - realized.get(trial, timestep + 1)
                    + overlay.get(trial, timestep + 1)
                    + contributions.get(timestep).copied().unwrap_or(0.0);
                path.push(next);
            }
            path
        })
        .collect();

    let mut grid = Grid2D::zeros(shape);
    for (trial, path) in paths.iter().enumerate() {
        for (timestep, &value) in path.iter().enumerate() {
            grid.set(timestep, trial, value);
        }
    }
    grid.to_series()
}
