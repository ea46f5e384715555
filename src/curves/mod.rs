//! Curve construction from the scenario grid
//!
//! Extracts named curve families, bootstraps forward/spot pairs, derives
//! year-on-year FX factors, and builds discount curves for the configured
//! bases. Everything here is computed once per run and then read-only.

mod discount;
mod families;
mod forward;
mod fx;

pub use discount::{discount_day0, discount_table, DiscountBasis};
pub use families::{extract_families, Currency, CurveFamily, CurveMapping, MappedColumn};
pub use forward::{derive_pair, CurvePair};
pub use fx::FxFactors;

use crate::error::{AlmError, Diagnostics};
use crate::grid::{GridShape, RawCurveTable, ScenarioGrid, TenorTable};
use std::collections::HashMap;

/// All curves derived from one scenario grid
#[derive(Debug, Clone)]
pub struct AlmCurves {
    shape: GridShape,
    raw: HashMap<CurveFamily, RawCurveTable>,
    pairs: HashMap<CurveFamily, CurvePair>,
}

impl AlmCurves {
    /// Extract families and derive forward/spot pairs
    ///
    /// Unmapped families become diagnostics; every resolvable family is
    /// carried even if the current configuration never discounts on it.
    pub fn build(
        grid: &ScenarioGrid,
        mapping: &CurveMapping,
        diags: &mut Diagnostics,
    ) -> Result<Self, AlmError> {
        let raw = extract_families(grid, mapping, diags)?;

        let mut pairs = HashMap::new();
        for (&family, table) in &raw {
            if family.needs_forward() {
                pairs.insert(family, derive_pair(table, family.needs_spot()));
            }
        }

        log::debug!(
            "curve construction: {} families resolved, {} forward pairs derived",
            raw.len(),
            pairs.len()
        );

        Ok(Self {
            shape: grid.shape(),
            raw,
            pairs,
        })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn has_family(&self, family: CurveFamily) -> bool {
        self.raw.contains_key(&family)
    }

    /// Raw extracted columns for a family
    pub fn raw(&self, family: CurveFamily) -> Result<&RawCurveTable, AlmError> {
        self.raw
            .get(&family)
            .ok_or(AlmError::MissingFamily { family })
    }

    /// Forward curve for a family
    pub fn forward(&self, family: CurveFamily) -> Result<&TenorTable, AlmError> {
        self.pairs
            .get(&family)
            .map(|p| &p.forward)
            .ok_or(AlmError::MissingFamily { family })
    }

    /// Spot curve for a family flagged as needing one
    pub fn spot(&self, family: CurveFamily) -> Result<&TenorTable, AlmError> {
        self.pairs
            .get(&family)
            .and_then(|p| p.spot.as_ref())
            .ok_or(AlmError::MissingFamily { family })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build curves from an arbitrary grid/mapping, panicking on failure
    pub(crate) fn curves_from_grid(grid: &ScenarioGrid, mapping: &CurveMapping) -> AlmCurves {
        let mut diags = Diagnostics::new();
        AlmCurves::build(grid, mapping, &mut diags).unwrap()
    }

    /// Synthetic curves: flat gilt and inflation spot curves (3 supplied
    /// tenors each) plus a constant realised-inflation index of 1
    pub(crate) fn flat_curves(
        trials: usize,
        horizon: usize,
        gilt_rate: f64,
        inflation_rate: f64,
    ) -> AlmCurves {
        let (grid, mapping) = flat_grid(trials, horizon, gilt_rate, inflation_rate);
        curves_from_grid(&grid, &mapping)
    }

    /// The grid/mapping behind `flat_curves`, for callers that need both
    pub(crate) fn flat_grid(
        trials: usize,
        horizon: usize,
        gilt_rate: f64,
        inflation_rate: f64,
    ) -> (ScenarioGrid, CurveMapping) {
        let columns = vec![
            "gilt_1".to_string(),
            "gilt_2".to_string(),
            "gilt_3".to_string(),
            "infl_1".to_string(),
            "infl_2".to_string(),
            "infl_3".to_string(),
            "rpi_index".to_string(),
        ];
        let mut records = Vec::new();
        for trial in 1..=trials {
            for timestep in 0..=horizon {
                records.push((
                    trial,
                    timestep,
                    vec![
                        gilt_rate,
                        gilt_rate,
                        gilt_rate,
                        inflation_rate,
                        inflation_rate,
                        inflation_rate,
                        1.0,
                    ],
                ));
            }
        }
        let grid = ScenarioGrid::from_records(columns, &records).unwrap();

        let mut mapping = CurveMapping::default();
        mapping.families.insert(
            CurveFamily::Gilts,
            vec![
                MappedColumn::named("gilt_1"),
                MappedColumn::named("gilt_2"),
                MappedColumn::named("gilt_3"),
            ],
        );
        mapping.families.insert(
            CurveFamily::Inflation,
            vec![
                MappedColumn::named("infl_1"),
                MappedColumn::named("infl_2"),
                MappedColumn::named("infl_3"),
            ],
        );
        mapping.families.insert(
            CurveFamily::RealisedInflation,
            vec![MappedColumn::named("rpi_index")],
        );
        (grid, mapping)
    }

    #[test]
    fn test_build_resolves_mapped_families() {
        let curves = flat_curves(2, 1, 0.02, 0.03);

        assert!(curves.has_family(CurveFamily::Gilts));
        assert!(curves.forward(CurveFamily::Gilts).is_ok());
        assert!(curves.spot(CurveFamily::Inflation).is_ok());
        // gilts are not flagged for spot recovery
        assert!(curves.spot(CurveFamily::Gilts).is_err());
        assert!(matches!(
            curves.forward(CurveFamily::Swaps),
            Err(AlmError::MissingFamily { .. })
        ));
    }
}
