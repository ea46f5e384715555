//! Bump-and-reprice sensitivities
//!
//! PV01 bumps every basis margin by one basis point and reprices; IE01
//! rebuilds the inflation-linked cashflows with the inflation assumption
//! bumped by one basis point and reprices on the unbumped curves. Both are
//! basis-wise differences against the base PV.

use super::pv::{present_values, pv_differences};
use crate::curves::{AlmCurves, DiscountBasis};
use crate::error::AlmError;
use crate::grid::{Series, TenorTable};
use crate::liabilities::CashflowModel;

/// One basis point
pub const BASIS_POINT: f64 = 0.0001;

/// Interest-rate sensitivity: PV(margin + bump) - PV(margin), per basis
pub fn pv01(
    total_cashflows: &TenorTable,
    curves: &AlmCurves,
    bases: &[DiscountBasis],
    base_pv: &[Series],
    bump: f64,
) -> Result<Vec<Series>, AlmError> {
    let bumped = present_values(total_cashflows, curves, bases, bump)?;
    Ok(pv_differences(&bumped, base_pv))
}

/// Inflation sensitivity: PV(cashflows at inflation + bump) - PV(base), per
/// basis
pub fn ie01(
    model: &CashflowModel,
    curves: &AlmCurves,
    bases: &[DiscountBasis],
    base_pv: &[Series],
    bump: f64,
) -> Result<Vec<Series>, AlmError> {
    let bumped_inflation = model.inflation_bumped(curves, bump)?;
    let bumped_total = model.total_cashflows(&bumped_inflation);
    let bumped = present_values(&bumped_total, curves, bases, 0.0)?;
    Ok(pv_differences(&bumped, base_pv))
}
