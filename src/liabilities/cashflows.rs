//! Liability cashflow derivation, scaling, and realization
//!
//! The caller supplies (or the proxy builds) a 100-year nominal/real
//! schedule. The engine scales it to a target day-0 value, unwinds the
//! remaining cashflows at every future timestep (a lower-triangular
//! left-shift by projection horizon), inflates the real component with
//! realized and expected inflation, and isolates the cashflow actually
//! falling due at each (trial, timestep).

use crate::curves::{discount_day0, AlmCurves, CurveFamily, DiscountBasis};
use crate::error::AlmError;
use crate::grid::{GridShape, Series, TenorTable, TENOR_COUNT};
use serde::{Deserialize, Serialize};

/// Nominal and real liability cashflows by projection year 1..=100
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowSchedule {
    pub nominal: Vec<f64>,
    pub real: Vec<f64>,
}

impl CashflowSchedule {
    pub fn new(nominal: Vec<f64>, real: Vec<f64>) -> Result<Self, AlmError> {
        let schedule = Self { nominal, real };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Schedule with no inflation-linked component
    pub fn nominal_only(nominal: Vec<f64>) -> Result<Self, AlmError> {
        let real = vec![0.0; nominal.len()];
        Self::new(nominal, real)
    }

    pub fn validate(&self) -> Result<(), AlmError> {
        for (name, vector) in [("nominal cashflows", &self.nominal), ("real cashflows", &self.real)]
        {
            if vector.len() != TENOR_COUNT {
                return Err(AlmError::TenorWidth {
                    name: name.to_string(),
                    expected: TENOR_COUNT,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }

    /// Both vectors scaled by a common factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            nominal: self.nominal.iter().map(|&v| v * factor).collect(),
            real: self.real.iter().map(|&v| v * factor).collect(),
        }
    }
}

/// Remaining nominal cashflows by timestep: row h is the original vector
/// left-shifted by h years and zero-padded. Shared across trials.
#[derive(Debug, Clone)]
pub struct UnwindTable {
    steps: usize,
    values: Vec<f64>,
}

impl UnwindTable {
    fn build(vector: &[f64], steps: usize) -> Self {
        let mut values = vec![0.0; steps * TENOR_COUNT];
        for h in 0..steps {
            let row = &mut values[h * TENOR_COUNT..(h + 1) * TENOR_COUNT];
            for (k, slot) in row.iter_mut().enumerate() {
                if h + k < TENOR_COUNT {
                    *slot = vector[h + k];
                }
            }
        }
        Self { steps, values }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn row(&self, timestep: usize) -> &[f64] {
        debug_assert!(timestep < self.steps);
        &self.values[timestep * TENOR_COUNT..(timestep + 1) * TENOR_COUNT]
    }
}

/// Day-0 present value of a schedule: real cashflows compounded to nominal
/// terms at the day-0 inflation spot curve, plus the nominal vector,
/// discounted on the given basis
pub fn day0_present_value(
    curves: &AlmCurves,
    basis: &DiscountBasis,
    schedule: &CashflowSchedule,
) -> Result<f64, AlmError> {
    schedule.validate()?;
    let discount = discount_day0(curves, basis, 0.0)?;
    let inflation_spot = curves.spot(CurveFamily::Inflation)?.row(0, 0);

    let mut pv = 0.0;
    for t in 0..TENOR_COUNT {
        let nominal_equivalent =
            schedule.real[t] * (1.0 + inflation_spot[t]).powi(t as i32 + 1) + schedule.nominal[t];
        pv += nominal_equivalent * discount[t];
    }
    Ok(pv)
}

/// All per-run liability cashflow tables, built once
#[derive(Debug, Clone)]
pub struct CashflowModel {
    shape: GridShape,
    /// Schedule after scaling to the target day-0 value
    pub scaled: CashflowSchedule,
    /// Applied scaling factor (target / computed day-0 PV)
    pub scaling: f64,
    /// Remaining nominal cashflows per timestep
    pub nominal_unwind: UnwindTable,
    /// Inflation-linked remaining cashflows per (trial, timestep)
    pub inflation: TenorTable,
    /// Cashflow actually due at each (trial, timestep); timestep 0 is zero
    pub realized: Series,
}

impl CashflowModel {
    /// Scale the schedule to the target value and derive every cashflow
    /// table on the unbumped inflation assumption
    pub fn build(
        curves: &AlmCurves,
        basis0: &DiscountBasis,
        schedule: &CashflowSchedule,
        target_value: f64,
    ) -> Result<Self, AlmError> {
        let shape = curves.shape();

        let pv = day0_present_value(curves, basis0, schedule)?;
        if pv.abs() < 1e-12 {
            return Err(AlmError::InvalidInput(
                "day-0 liability present value is zero; cannot scale cashflows to the starting value"
                    .to_string(),
            ));
        }
        let scaling = target_value / pv;
        let scaled = schedule.scaled(scaling);
        log::info!(
            "liability scaling: computed day-0 PV {:.4}, target {:.4}, factor {:.6}",
            pv,
            target_value,
            scaling
        );

        let nominal_unwind = UnwindTable::build(&scaled.nominal, shape.steps());
        let inflation = inflation_unwind(curves, &scaled.real, 0.0)?;
        let realized = realized_cashflows(curves, &nominal_unwind, &inflation)?;

        Ok(Self {
            shape,
            scaled,
            scaling,
            nominal_unwind,
            inflation,
            realized,
        })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Inflation-linked cashflows under a bumped inflation assumption
    pub fn inflation_bumped(&self, curves: &AlmCurves, bump: f64) -> Result<TenorTable, AlmError> {
        inflation_unwind(curves, &self.scaled.real, bump)
    }

    /// Total cashflow table: an inflation-linked table plus the tiled
    /// nominal unwind
    pub fn total_cashflows(&self, inflation: &TenorTable) -> TenorTable {
        let mut total = TenorTable::zeros(self.shape);
        for trial in 0..self.shape.trials {
            for timestep in 0..self.shape.steps() {
                let inf = inflation.row(trial, timestep);
                let nom = self.nominal_unwind.row(timestep);
                let out = total.row_mut(trial, timestep);
                for t in 0..TENOR_COUNT {
                    out[t] = inf[t] + nom[t];
                }
            }
        }
        total
    }

    /// Inflation cashflows restated one tenor-step earlier and one grid row
    /// later: what last year's profile looks like under this year's grid.
    /// The timestep-0 boundary is clamped to the unshifted row.
    pub fn previous_year_view(&self) -> TenorTable {
        let mut view = TenorTable::zeros(self.shape);
        for trial in 0..self.shape.trials {
            view.row_mut(trial, 0)
                .copy_from_slice(self.inflation.row(trial, 0));
            for timestep in 1..self.shape.steps() {
                let prior = self.inflation.row(trial, timestep - 1);
                let out = view.row_mut(trial, timestep);
                out[..TENOR_COUNT - 1].copy_from_slice(&prior[1..]);
                out[TENOR_COUNT - 1] = 0.0;
            }
        }
        view
    }
}

/// Remaining real cashflows inflated by the realized cumulative index and
/// the expected forward inflation spot curve (optionally bumped)
fn inflation_unwind(
    curves: &AlmCurves,
    real: &[f64],
    bump: f64,
) -> Result<TenorTable, AlmError> {
    let shape = curves.shape();
    let index = realized_inflation_index(curves)?;
    let spot = curves.spot(CurveFamily::Inflation)?;

    let mut table = TenorTable::zeros(shape);
    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let idx = index.get(trial, timestep);
            let spot_row = spot.row(trial, timestep);
            let out = table.row_mut(trial, timestep);
            for k in 0..TENOR_COUNT {
                let remaining = if timestep + k < TENOR_COUNT {
                    real[timestep + k]
                } else {
                    0.0
                };
                out[k] =
                    remaining * idx * (1.0 + spot_row[k] + bump).powi(k as i32 + 1);
            }
        }
    }
    Ok(table)
}

/// The cashflow actually falling due at each (trial, timestep): last year's
/// one-year-ahead inflation-linked amount, re-deflated by one year of
/// expected inflation and re-inflated by one year of realized inflation,
/// plus the nominal cashflow scheduled this step. Timestep 0 is zero.
fn realized_cashflows(
    curves: &AlmCurves,
    nominal_unwind: &UnwindTable,
    inflation: &TenorTable,
) -> Result<Series, AlmError> {
    let shape = curves.shape();
    let index = realized_inflation_index(curves)?;
    let spot = curves.spot(CurveFamily::Inflation)?;

    let mut realized = Series::zeros(shape);
    for trial in 0..shape.trials {
        for timestep in 1..shape.steps() {
            let due_next = inflation.row(trial, timestep - 1)[0];
            let realized_ratio =
                index.get(trial, timestep) / index.get(trial, timestep - 1);
            let expected_deflator = 1.0 / (1.0 + spot.row(trial, timestep - 1)[0]);

            let linked = due_next * realized_ratio * expected_deflator;
            let nominal = nominal_unwind.row(timestep - 1)[0];
            realized.set(trial, timestep, linked + nominal);
        }
    }
    Ok(realized)
}

/// Realized cumulative inflation index series (one column per grid row)
fn realized_inflation_index(curves: &AlmCurves) -> Result<Series, AlmError> {
    let raw = curves.raw(CurveFamily::RealisedInflation)?;
    if raw.width() == 0 {
        return Err(AlmError::MissingFamily {
            family: CurveFamily::RealisedInflation,
        });
    }
    Ok(raw.column(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::tests::flat_curves;
    use approx::assert_relative_eq;

    fn level_nominal(value: f64, years: usize) -> CashflowSchedule {
        let mut nominal = vec![0.0; TENOR_COUNT];
        for slot in nominal.iter_mut().take(years) {
            *slot = value;
        }
        CashflowSchedule::nominal_only(nominal).unwrap()
    }

    fn test_basis() -> DiscountBasis {
        DiscountBasis::flat("gilts", CurveFamily::Gilts, 0.0)
    }

    #[test]
    fn test_schedule_width_is_validated() {
        assert!(matches!(
            CashflowSchedule::new(vec![0.0; 50], vec![0.0; 100]),
            Err(AlmError::TenorWidth { .. })
        ));
    }

    #[test]
    fn test_day0_pv_is_linear_in_cashflows() {
        let curves = flat_curves(1, 2, 0.02, 0.03);
        let basis = test_basis();
        let schedule = level_nominal(100.0, 3);

        let pv = day0_present_value(&curves, &basis, &schedule).unwrap();
        let pv_scaled =
            day0_present_value(&curves, &basis, &schedule.scaled(3.0)).unwrap();

        assert_relative_eq!(pv_scaled, 3.0 * pv, max_relative = 1e-12);
    }

    #[test]
    fn test_scaling_hits_target_value() {
        let curves = flat_curves(2, 3, 0.02, 0.0);
        let basis = test_basis();
        let schedule = level_nominal(100.0, 3);

        let model = CashflowModel::build(&curves, &basis, &schedule, 250.0).unwrap();
        let pv = day0_present_value(&curves, &basis, &model.scaled).unwrap();
        assert_relative_eq!(pv, 250.0, max_relative = 1e-10);

        // raw PV of three 100s at flat 2%
        let raw_pv: f64 = (1..=3).map(|t| 100.0 / 1.02_f64.powi(t)).sum();
        assert_relative_eq!(model.scaling, 250.0 / raw_pv, max_relative = 1e-10);
    }

    #[test]
    fn test_zero_pv_cannot_be_scaled() {
        let curves = flat_curves(1, 1, 0.02, 0.0);
        let basis = test_basis();
        let schedule = level_nominal(0.0, 0);

        assert!(matches!(
            CashflowModel::build(&curves, &basis, &schedule, 250.0),
            Err(AlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_nominal_unwind_is_triangular() {
        let curves = flat_curves(1, 3, 0.02, 0.0);
        let basis = test_basis();
        let schedule = level_nominal(100.0, 3);

        let model = CashflowModel::build(&curves, &basis, &schedule, 250.0).unwrap();
        let first = model.scaled.nominal[0];

        // timestep 0 holds all three payments; each later step drops one
        assert_relative_eq!(model.nominal_unwind.row(0)[2], first, max_relative = 1e-12);
        assert_relative_eq!(model.nominal_unwind.row(1)[1], first, max_relative = 1e-12);
        assert_eq!(model.nominal_unwind.row(1)[2], 0.0);
        assert_eq!(model.nominal_unwind.row(3)[0], 0.0);
    }

    #[test]
    fn test_realized_cashflow_is_zero_at_timestep_zero() {
        let curves = flat_curves(3, 2, 0.02, 0.03);
        let basis = test_basis();
        let mut schedule = level_nominal(100.0, 5);
        schedule.real = vec![10.0; TENOR_COUNT];

        let model = CashflowModel::build(&curves, &basis, &schedule, 500.0).unwrap();
        for trial in 0..3 {
            assert_eq!(model.realized.get(trial, 0), 0.0);
        }
    }

    #[test]
    fn test_realized_nominal_part_is_scheduled_payment() {
        // No inflation linkage: realized at step t is the scaled year-t payment
        let curves = flat_curves(2, 3, 0.02, 0.0);
        let basis = test_basis();
        let schedule = level_nominal(100.0, 3);

        let model = CashflowModel::build(&curves, &basis, &schedule, 250.0).unwrap();
        for trial in 0..2 {
            assert_relative_eq!(
                model.realized.get(trial, 1),
                model.scaled.nominal[0],
                max_relative = 1e-12
            );
            assert_relative_eq!(
                model.realized.get(trial, 3),
                model.scaled.nominal[2],
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_previous_year_view_clamps_timestep_zero() {
        let curves = flat_curves(1, 2, 0.02, 0.03);
        let basis = test_basis();
        let mut schedule = level_nominal(0.0, 0);
        schedule.real = vec![10.0; TENOR_COUNT];

        let model = CashflowModel::build(&curves, &basis, &schedule, 100.0).unwrap();
        let view = model.previous_year_view();

        assert_eq!(view.row(0, 0), model.inflation.row(0, 0));
        // shifted cell: view(t)[k] = inflation(t-1)[k+1]
        assert_relative_eq!(
            view.row(0, 1)[0],
            model.inflation.row(0, 0)[1],
            max_relative = 1e-12
        );
        assert_eq!(view.row(0, 1)[TENOR_COUNT - 1], 0.0);
    }

    #[test]
    fn test_inflation_unwind_compounds_expected_inflation() {
        let curves = flat_curves(1, 1, 0.02, 0.03);
        let basis = test_basis();
        let mut schedule = level_nominal(0.0, 0);
        schedule.real = vec![10.0; TENOR_COUNT];

        let model = CashflowModel::build(&curves, &basis, &schedule, 100.0).unwrap();
        let real0 = model.scaled.real[0];

        // index is 1, so cell (t=0, k) = real * 1.03^(k+1)
        assert_relative_eq!(
            model.inflation.row(0, 0)[4],
            real0 * 1.03_f64.powi(5),
            max_relative = 1e-10
        );
    }
}
