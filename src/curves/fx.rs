//! Year-on-year FX conversion factors
//!
//! Raw FX levels are quoted as [CUR]/GBP; the year-on-year factor inverts
//! the quote convention: factor_t = 1 / (1 + pct_change(level_t)), which is
//! level_{t-1} / level_t. Timestep 0 is defined as 1 (no return) for every
//! currency, and GBP itself is the numeraire with a constant factor of 1.

use super::families::{Currency, CurveFamily, CurveMapping};
use super::AlmCurves;
use crate::error::AlmError;
use crate::grid::Series;
use std::collections::HashMap;

/// Per-currency year-on-year FX factors
#[derive(Debug, Clone, Default)]
pub struct FxFactors {
    factors: HashMap<Currency, Series>,
}

impl FxFactors {
    /// Derive factors from the raw `fx_rates` family, if it was resolved
    ///
    /// An absent family yields an empty factor set; the gap only becomes an
    /// error if a non-GBP asset class later asks for conversion.
    pub fn build(curves: &AlmCurves, mapping: &CurveMapping) -> Self {
        let mut factors = HashMap::new();

        let (Ok(raw), Some(columns)) = (
            curves.raw(CurveFamily::FxRates),
            mapping.columns(CurveFamily::FxRates),
        ) else {
            return Self { factors };
        };

        let shape = raw.shape();
        for (idx, mapped) in columns.iter().enumerate().take(raw.width()) {
            let levels = raw.column(idx);
            let mut series = Series::zeros(shape);
            for trial in 0..shape.trials {
                series.set(trial, 0, 1.0);
                for timestep in 1..shape.steps() {
                    let prev = levels.get(trial, timestep - 1);
                    let curr = levels.get(trial, timestep);
                    series.set(trial, timestep, prev / curr);
                }
            }
            factors.insert(mapped.currency, series);
        }

        Self { factors }
    }

    /// Conversion factor for one currency at one grid row
    pub fn factor(
        &self,
        currency: Currency,
        trial: usize,
        timestep: usize,
    ) -> Result<f64, AlmError> {
        if currency == Currency::Gbp {
            return Ok(1.0);
        }
        self.factors
            .get(&currency)
            .map(|s| s.get(trial, timestep))
            .ok_or(AlmError::MissingFamily {
                family: CurveFamily::FxRates,
            })
    }
}
