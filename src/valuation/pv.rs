//! Multi-basis present value
//!
//! One PV series per configured discounting basis, in input order; bases
//! are addressed by position, never by string key.

use crate::curves::{discount_table, AlmCurves, DiscountBasis};
use crate::error::AlmError;
use crate::grid::{Series, TenorTable, TENOR_COUNT};

/// Present value of the total cashflow table on every basis
///
/// `pv_bump` is a uniform addition to each basis margin, used for
/// bump-and-reprice sensitivity runs.
pub fn present_values(
    cashflows: &TenorTable,
    curves: &AlmCurves,
    bases: &[DiscountBasis],
    pv_bump: f64,
) -> Result<Vec<Series>, AlmError> {
    let shape = cashflows.shape();
    let mut out = Vec::with_capacity(bases.len());

    for basis in bases {
        let discount = discount_table(curves, basis, pv_bump)?;
        let mut pv = Series::zeros(shape);
        for trial in 0..shape.trials {
            for timestep in 0..shape.steps() {
                let cf = cashflows.row(trial, timestep);
                let df = discount.row(trial, timestep);
                let mut sum = 0.0;
                for t in 0..TENOR_COUNT {
                    sum += cf[t] * df[t];
                }
                pv.set(trial, timestep, sum);
            }
        }
        out.push(pv);
    }
    Ok(out)
}

/// Basis-wise elementwise difference between two PV collections
pub fn pv_differences(bumped: &[Series], base: &[Series]) -> Vec<Series> {
    debug_assert_eq!(bumped.len(), base.len());
    bumped
        .iter()
        .zip(base)
        .map(|(b, a)| {
            let shape = a.shape();
            let values = b
                .values()
                .iter()
                .zip(a.values())
                .map(|(&x, &y)| x - y)
                .collect();
            Series::from_values(shape, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::tests::flat_curves;
    use crate::curves::CurveFamily;
    use crate::liabilities::{CashflowModel, CashflowSchedule};
    use approx::assert_relative_eq;

    fn flat_model() -> (crate::curves::AlmCurves, DiscountBasis, CashflowModel) {
        let curves = flat_curves(2, 3, 0.02, 0.0);
        let basis = DiscountBasis::flat("gilts", CurveFamily::Gilts, 0.0);
        let mut nominal = vec![0.0; TENOR_COUNT];
        nominal[..3].copy_from_slice(&[100.0, 100.0, 100.0]);
        let schedule = CashflowSchedule::nominal_only(nominal).unwrap();
        let model = CashflowModel::build(&curves, &basis, &schedule, 250.0).unwrap();
        (curves, basis, model)
    }

    #[test]
    fn test_day0_pv_matches_scaling_target() {
        let (curves, basis, model) = flat_model();
        let total = model.total_cashflows(&model.inflation);

        let pv = present_values(&total, &curves, &[basis], 0.0).unwrap();
        assert_eq!(pv.len(), 1);
        assert_relative_eq!(pv[0].get(0, 0), 250.0, max_relative = 1e-10);
        assert_relative_eq!(pv[0].get(1, 0), 250.0, max_relative = 1e-10);
    }

    #[test]
    fn test_pv_declines_as_cashflows_roll_off() {
        let (curves, basis, model) = flat_model();
        let total = model.total_cashflows(&model.inflation);
        let pv = present_values(&total, &curves, &[basis], 0.0).unwrap();

        // each timestep drops one of the three payments
        assert!(pv[0].get(0, 1) < pv[0].get(0, 0));
        assert!(pv[0].get(0, 2) < pv[0].get(0, 1));
        assert_relative_eq!(pv[0].get(0, 3), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bases_keep_input_order() {
        let (curves, basis, model) = flat_model();
        let total = model.total_cashflows(&model.inflation);

        let wide = DiscountBasis::flat("gilts+100bp", CurveFamily::Gilts, 0.01);
        let pv = present_values(&total, &curves, &[basis, wide], 0.0).unwrap();

        assert_eq!(pv.len(), 2);
        // higher margin discounts harder
        assert!(pv[1].get(0, 0) < pv[0].get(0, 0));
    }

    #[test]
    fn test_differences_are_elementwise() {
        let (curves, basis, model) = flat_model();
        let total = model.total_cashflows(&model.inflation);

        let base = present_values(&total, &curves, std::slice::from_ref(&basis), 0.0).unwrap();
        let bumped = present_values(&total, &curves, &[basis], 0.0001).unwrap();

        let diff = pv_differences(&bumped, &base);
        assert!(diff[0].get(0, 0) < 0.0); // bump raises rates, lowers PV
        assert_relative_eq!(
            diff[0].get(0, 0),
            bumped[0].get(0, 0) - base[0].get(0, 0),
            max_relative = 1e-12
        );
    }
}
