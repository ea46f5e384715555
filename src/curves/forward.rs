//! Forward and spot curve derivation
//!
//! Input curves arrive as cumulative (spot) rates for tenors 1..=width.
//! Forwards are bootstrapped tenor by tenor and extrapolated flat at the
//! last computed forward out to tenor 100; spot curves are recovered from
//! the forwards by cumulative compounding where a family needs one.

use crate::grid::{RawCurveTable, TenorTable, TENOR_COUNT};

/// Forward curve plus, for flagged families, the recompounded spot curve
#[derive(Debug, Clone)]
pub struct CurvePair {
    pub forward: TenorTable,
    pub spot: Option<TenorTable>,
}

/// Derive the forward/spot pair for one curve family
pub fn derive_pair(raw: &RawCurveTable, with_spot: bool) -> CurvePair {
    let shape = raw.shape();
    let width = raw.width().min(TENOR_COUNT);

    let mut forward = TenorTable::zeros(shape);
    if width == 0 {
        return CurvePair {
            spot: with_spot.then(|| forward.clone()),
            forward,
        };
    }
    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let input = raw.row(trial, timestep);
            let out = forward.row_mut(trial, timestep);

            // forward_t = (1+c_t)^t / (1+c_{t-1})^{t-1} - 1, with c_0 = 0
            let mut prev_cum = 1.0_f64;
            for t in 1..=width {
                let cum = (1.0 + input[t - 1]).powi(t as i32);
                out[t - 1] = cum / prev_cum - 1.0;
                prev_cum = cum;
            }

            // Flat extrapolation at the last computed forward
            let last = out[width - 1];
            for slot in out[width..].iter_mut() {
                *slot = last;
            }
        }
    }

    let spot = with_spot.then(|| recompound_spot(&forward));

    CurvePair { forward, spot }
}

/// spot_t = (prod_{s<=t} (1+forward_s))^(1/t) - 1
fn recompound_spot(forward: &TenorTable) -> TenorTable {
    let shape = forward.shape();
    let mut spot = TenorTable::zeros(shape);

    for trial in 0..shape.trials {
        for timestep in 0..shape.steps() {
            let fwd = forward.row(trial, timestep);
            let out = spot.row_mut(trial, timestep);

            let mut cum = 1.0_f64;
            for t in 1..=TENOR_COUNT {
                cum *= 1.0 + fwd[t - 1];
                out[t - 1] = cum.powf(1.0 / t as f64) - 1.0;
            }
        }
    }
    spot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridShape;
    use approx::assert_relative_eq;

    fn raw_from_rows(shape: GridShape, row: &[f64]) -> RawCurveTable {
        let mut values = Vec::new();
        for _ in 0..shape.rows() {
            values.extend_from_slice(row);
        }
        RawCurveTable::new(shape, row.len(), values)
    }

    #[test]
    fn test_flat_curve_gives_flat_forwards() {
        let shape = GridShape::new(1, 0);
        let raw = raw_from_rows(shape, &[0.03; 20]);

        let pair = derive_pair(&raw, false);
        let fwd = pair.forward.row(0, 0);

        for t in 0..TENOR_COUNT {
            assert_relative_eq!(fwd[t], 0.03, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_forward_spot_round_trip() {
        // Upward-sloping spot curve; recompounding forwards must reproduce it
        let shape = GridShape::new(1, 0);
        let input: Vec<f64> = (1..=30).map(|t| 0.01 + 0.001 * t as f64).collect();
        let raw = raw_from_rows(shape, &input);

        let pair = derive_pair(&raw, true);
        let spot = pair.spot.unwrap();
        let row = spot.row(0, 0);

        for (t, &expected) in input.iter().enumerate() {
            assert_relative_eq!(row[t], expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_extrapolation_is_flat_beyond_width() {
        let shape = GridShape::new(1, 0);
        let raw = raw_from_rows(shape, &[0.02, 0.025, 0.03]);

        let pair = derive_pair(&raw, false);
        let fwd = pair.forward.row(0, 0);

        // forward_3 = 1.03^3 / 1.025^2 - 1
        let f3 = 1.03_f64.powi(3) / 1.025_f64.powi(2) - 1.0;
        assert_relative_eq!(fwd[2], f3, max_relative = 1e-12);
        for t in 3..TENOR_COUNT {
            assert_relative_eq!(fwd[t], f3, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_first_forward_equals_first_spot() {
        let shape = GridShape::new(1, 0);
        let raw = raw_from_rows(shape, &[0.017, 0.02]);

        let pair = derive_pair(&raw, false);
        assert_relative_eq!(pair.forward.row(0, 0)[0], 0.017, max_relative = 1e-12);
    }
}
