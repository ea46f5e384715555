//! Discount curves built from a base forward curve plus an additive margin
//!
//! Each discounting basis names a base curve family and a 100-point margin
//! vector. The same machinery serves sensitivity repricing: a uniform
//! basis-point bump is added on top of the margin.

use super::families::CurveFamily;
use super::AlmCurves;
use crate::error::AlmError;
use crate::grid::{TenorTable, TENOR_COUNT};

/// One discounting basis: a base curve family and a margin over it
#[derive(Debug, Clone)]
pub struct DiscountBasis {
    pub name: String,
    pub base: CurveFamily,
    pub margin: Vec<f64>,
}

impl DiscountBasis {
    /// Build a basis, validating the margin width
    pub fn new(
        name: impl Into<String>,
        base: CurveFamily,
        margin: Vec<f64>,
    ) -> Result<Self, AlmError> {
        let name = name.into();
        if margin.len() != TENOR_COUNT {
            return Err(AlmError::TenorWidth {
                name: format!("margin for basis '{}'", name),
                expected: TENOR_COUNT,
                actual: margin.len(),
            });
        }
        Ok(Self { name, base, margin })
    }

    /// Basis with a uniform margin at every tenor
    pub fn flat(name: impl Into<String>, base: CurveFamily, margin: f64) -> Self {
        Self {
            name: name.into(),
            base,
            margin: vec![margin; TENOR_COUNT],
        }
    }

    /// Assemble an ordered basis list from parallel name/base/margin tables,
    /// checking that the tables agree on the basis count
    pub fn from_tables(
        names: &[String],
        bases: &[CurveFamily],
        margins: &[Vec<f64>],
    ) -> Result<Vec<Self>, AlmError> {
        if bases.len() != margins.len() {
            return Err(AlmError::BasisCount {
                margins: margins.len(),
                bases: bases.len(),
            });
        }
        if names.len() != bases.len() {
            return Err(AlmError::BasisCount {
                margins: names.len(),
                bases: bases.len(),
            });
        }
        names
            .iter()
            .zip(bases.iter().zip(margins.iter()))
            .map(|(name, (&base, margin))| Self::new(name.clone(), base, margin.clone()))
            .collect()
    }
}

/// Discount factors at every (trial, timestep) row for one basis
///
/// discount_t = 1 / prod_{s<=t} (1 + forward_s + margin_s + bump)
pub fn discount_table(
    curves: &AlmCurves,
    basis: &DiscountBasis,
    bump: f64,
) -> Result<TenorTable, AlmError> {
    let forward = curves.forward(basis.base)?;
    let shape = forward.shape();

    let mut table = TenorTable::zeros(shape);
    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let fwd = forward.row(trial, timestep);
            let out = table.row_mut(trial, timestep);

            let mut cum = 1.0_f64;
            for t in 0..TENOR_COUNT {
                cum *= 1.0 + fwd[t] + basis.margin[t] + bump;
                out[t] = 1.0 / cum;
            }
        }
    }
    Ok(table)
}

/// Day-0 discount factors (trial 1, timestep 0) for one basis
pub fn discount_day0(
    curves: &AlmCurves,
    basis: &DiscountBasis,
    bump: f64,
) -> Result<Vec<f64>, AlmError> {
    let forward = curves.forward(basis.base)?;
    let fwd = forward.row(0, 0);

    let mut out = vec![0.0; TENOR_COUNT];
    let mut cum = 1.0_f64;
    for t in 0..TENOR_COUNT {
        cum *= 1.0 + fwd[t] + basis.margin[t] + bump;
        out[t] = 1.0 / cum;
    }
    Ok(out)
}
