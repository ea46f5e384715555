//! LDI hedging: P&L attribution, hedge overlay cashflows, and leverage
//!
//! Attribution splits each period's liability PV change (net of the realized
//! cashflow) into an interest component and an inflation component, using the
//! first configured basis as the single hedging reference. The overlay scales
//! each component by its hedge ratio; leverage compares the hedged liability
//! notional to the physical LDI asset backing.

use crate::error::AlmError;
use crate::grid::Series;
use serde::{Deserialize, Serialize};

/// Hedge ratios per risk factor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HedgeRatios {
    pub interest: f64,
    pub inflation: f64,
}

impl HedgeRatios {
    /// No hedging on either factor
    pub fn zero() -> Self {
        Self {
            interest: 0.0,
            inflation: 0.0,
        }
    }
}

/// Period P&L attribution on the hedging basis
#[derive(Debug, Clone)]
pub struct LdiImpacts {
    pub interest: Series,
    pub inflation: Series,
}

/// Attribute each period's PV movement into interest and inflation parts
///
/// interest_t = PV_prevYearView_t - PV_{t-1} + realizedCashflow_t (zero at
/// timestep 0); inflation_t = PV_t - PV_prevYearView_t. The two components
/// sum to the total PV change net of the realized cashflow.
pub fn ldi_impacts(
    pv: &Series,
    pv_prev_view: &Series,
    realized: &Series,
) -> Result<LdiImpacts, AlmError> {
    let shape = pv.shape();
    for other in [pv_prev_view.shape(), realized.shape()] {
        if other != shape {
            return Err(AlmError::ShapeMismatch {
                expected_trials: shape.trials,
                expected_steps: shape.steps(),
                actual_trials: other.trials,
                actual_steps: other.steps(),
            });
        }
    }
    let mut interest = Series::zeros(shape);
    let mut inflation = Series::zeros(shape);

    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            if timestep > 0 {
                let value = pv_prev_view.get(trial, timestep) - pv.get(trial, timestep - 1)
                    + realized.get(trial, timestep);
                interest.set(trial, timestep, value);
            }
            inflation.set(
                trial,
                timestep,
                pv.get(trial, timestep) - pv_prev_view.get(trial, timestep),
            );
        }
    }

    Ok(LdiImpacts {
        interest,
        inflation,
    })
}

/// Hedge overlay cashflow: each factor impact scaled by its hedge ratio
pub fn hedge_overlay(impacts: &LdiImpacts, ratios: HedgeRatios) -> Series {
    let shape = impacts.interest.shape();
    let values = impacts
        .interest
        .values()
        .iter()
        .zip(impacts.inflation.values())
        .map(|(&int, &inf)| int * ratios.interest + inf * ratios.inflation)
        .collect();
    Series::from_values(shape, values)
}

/// Leverage per basis: hedged liability notional over physical LDI backing
///
/// leverage_t = (PV_t * interest_ratio) / (asset_t * ldi_fraction). A zero
/// denominator yields NaN rather than a signed infinity.
pub fn leverage(
    pv_per_basis: &[Series],
    interest_ratio: f64,
    ldi_fraction: f64,
    assets: &Series,
) -> Vec<Series> {
    pv_per_basis
        .iter()
        .map(|pv| {
            let shape = pv.shape();
            let values = pv
                .values()
                .iter()
                .zip(assets.values())
                .map(|(&p, &a)| {
                    let backing = a * ldi_fraction;
                    if backing == 0.0 {
                        f64::NAN
                    } else {
                        p * interest_ratio / backing
                    }
                })
                .collect();
            Series::from_values(shape, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    fn series(shape: GridShape, f: impl Fn(usize, usize) -> f64) -> Series {
        let mut s = Series::zeros(shape);
        for trial in 0..shape.trials {
            for timestep in 0..shape.steps() {
                s.set(trial, timestep, f(trial, timestep));
            }
        }
        s
    }

    #[test]
    fn test_components_sum_to_pv_change_net_of_cashflow() {
        let shape = GridShape::new(2, 3);
        let pv = series(shape, |tr, ts| 1000.0 - 50.0 * ts as f64 + 10.0 * tr as f64);
        let pv_prev = series(shape, |tr, ts| 990.0 - 48.0 * ts as f64 + 10.0 * tr as f64);
        let realized = series(shape, |_, ts| if ts > 0 { 40.0 } else { 0.0 });

        let impacts = ldi_impacts(&pv, &pv_prev, &realized).unwrap();

        for trial in 0..2 {
            for timestep in 1..=3 {
                let total = impacts.interest.get(trial, timestep)
                    + impacts.inflation.get(trial, timestep);
                let expected = pv.get(trial, timestep) - pv.get(trial, timestep - 1)
                    + realized.get(trial, timestep);
                assert_relative_eq!(total, expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_interest_impact_forced_zero_at_timestep_zero() {
        let shape = GridShape::new(1, 2);
        let pv = series(shape, |_, ts| 100.0 + ts as f64);
        let pv_prev = series(shape, |_, ts| 90.0 + ts as f64);
        let realized = Series::zeros(shape);

        let impacts = ldi_impacts(&pv, &pv_prev, &realized).unwrap();
        assert_eq!(impacts.interest.get(0, 0), 0.0);
        assert_relative_eq!(impacts.inflation.get(0, 0), 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_overlay_applies_ratios_per_factor() {
        let shape = GridShape::new(1, 1);
        let impacts = LdiImpacts {
            interest: series(shape, |_, _| 100.0),
            inflation: series(shape, |_, _| 10.0),
        };
        let overlay = hedge_overlay(
            &impacts,
            HedgeRatios {
                interest: 0.5,
                inflation: 0.8,
            },
        );
        assert_relative_eq!(overlay.get(0, 1), 58.0, max_relative = 1e-12);
    }

    #[test]
    fn test_mismatched_shapes_are_fatal() {
        let pv = Series::zeros(GridShape::new(2, 3));
        let other = Series::zeros(GridShape::new(2, 2));
        assert!(matches!(
            ldi_impacts(&pv, &other, &pv),
            Err(AlmError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_leverage_ratio() {
        let shape = GridShape::new(1, 0);
        let pv = vec![series(shape, |_, _| 1000.0)];
        let assets = series(shape, |_, _| 500.0);

        let lev = leverage(&pv, 0.9, 0.2, &assets);
        // 1000 * 0.9 / (500 * 0.2) = 9
        assert_relative_eq!(lev[0].get(0, 0), 9.0, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_ldi_backing_is_nan() {
        let shape = GridShape::new(1, 0);
        let pv = vec![series(shape, |_, _| 1000.0)];
        let assets = series(shape, |_, _| 500.0);

        let lev = leverage(&pv, 0.9, 0.0, &assets);
        assert!(lev[0].get(0, 0).is_nan());
    }
}
