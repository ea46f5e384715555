//! Liability cashflow proxy via duration matching
//!
//! When no explicit cashflow schedule is supplied, a proxy is built by
//! blending two reference profiles ("low duration", "high duration") so that
//! the blend's day-0 discounted duration hits a target. The blend weight is
//! found by Newton iteration with a numeric derivative, falling back to
//! bisection over a scanned bracket; non-convergence is an explicit error,
//! never a silently accepted approximation.

use super::CashflowSchedule;
use crate::error::AlmError;
use crate::grid::TENOR_COUNT;

/// Convergence tolerance on the duration residual (years)
pub const SOLVER_TOLERANCE: f64 = 1e-8;

/// Iteration cap shared by the Newton and bisection phases
pub const SOLVER_MAX_ITERATIONS: usize = 100;

/// Reference cashflow profiles for proxy construction
#[derive(Debug, Clone)]
pub struct ProxyProfiles {
    pub low_duration: Vec<f64>,
    pub high_duration: Vec<f64>,
}

impl ProxyProfiles {
    pub fn new(low_duration: Vec<f64>, high_duration: Vec<f64>) -> Result<Self, AlmError> {
        for (name, profile) in [
            ("low duration profile", &low_duration),
            ("high duration profile", &high_duration),
        ] {
            if profile.len() != TENOR_COUNT {
                return Err(AlmError::TenorWidth {
                    name: name.to_string(),
                    expected: TENOR_COUNT,
                    actual: profile.len(),
                });
            }
        }
        Ok(Self {
            low_duration,
            high_duration,
        })
    }

    fn blend(&self, weight: f64) -> Vec<f64> {
        self.low_duration
            .iter()
            .zip(&self.high_duration)
            .map(|(&lo, &hi)| weight * lo + (1.0 - weight) * hi)
            .collect()
    }
}

/// Discounted-cashflow-weighted average maturity in years
///
/// duration = sum(year * df * cf) / sum(df * cf) over tenor years 1..=100.
pub fn duration(cashflows: &[f64], discount: &[f64]) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (t, (&cf, &df)) in cashflows.iter().zip(discount).enumerate() {
        let pv = cf * df;
        weighted += (t + 1) as f64 * pv;
        total += pv;
    }
    weighted / total
}

/// Solve for the blend weight whose duration matches the target
///
/// Returns the blended profile. Newton iteration starts at weight 1 (all
/// low-duration); if the derivative degenerates or the iteration cap is hit,
/// a bisection over a scanned bracket is tried before giving up with
/// `AlmError::SolverDiverged`.
pub fn match_duration(
    profiles: &ProxyProfiles,
    target: f64,
    discount_day0: &[f64],
) -> Result<Vec<f64>, AlmError> {
    let residual = |w: f64| duration(&profiles.blend(w), discount_day0) - target;

    let mut weight = 1.0_f64;
    let step = 1e-6;

    for iteration in 0..SOLVER_MAX_ITERATIONS {
        let f = residual(weight);
        if f.abs() < SOLVER_TOLERANCE {
            log::debug!(
                "duration match converged: weight {:.6} after {} iterations",
                weight,
                iteration
            );
            return Ok(profiles.blend(weight));
        }

        let derivative = (residual(weight + step) - residual(weight - step)) / (2.0 * step);
        if !derivative.is_finite() || derivative.abs() < 1e-14 {
            break;
        }

        let next = weight - f / derivative;
        if !next.is_finite() {
            break;
        }
        weight = next;
    }

    match_duration_bisection(profiles, target, discount_day0)
}

/// Bisection fallback: scan unit steps over [-10, 10] for a sign change,
/// then bisect it down to tolerance
fn match_duration_bisection(
    profiles: &ProxyProfiles,
    target: f64,
    discount_day0: &[f64],
) -> Result<Vec<f64>, AlmError> {
    let residual = |w: f64| duration(&profiles.blend(w), discount_day0) - target;

    let mut bracket = None;
    let mut prev: Option<(f64, f64)> = None;
    for i in -10..=10 {
        let w = i as f64;
        let f = residual(w);
        if !f.is_finite() {
            prev = None;
            continue;
        }
        if f.abs() < SOLVER_TOLERANCE {
            return Ok(profiles.blend(w));
        }
        if let Some((pw, pf)) = prev {
            if pf * f < 0.0 {
                bracket = Some((pw, w));
                break;
            }
        }
        prev = Some((w, f));
    }

    let Some((mut low, mut high)) = bracket else {
        return Err(AlmError::SolverDiverged {
            iterations: SOLVER_MAX_ITERATIONS,
            residual: residual(1.0),
        });
    };

    let mut f_low = residual(low);
    for _ in 0..SOLVER_MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let f_mid = residual(mid);
        if f_mid.abs() < SOLVER_TOLERANCE {
            return Ok(profiles.blend(mid));
        }
        if f_low * f_mid < 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    Err(AlmError::SolverDiverged {
        iterations: 2 * SOLVER_MAX_ITERATIONS,
        residual: residual(0.5 * (low + high)),
    })
}

/// Duration-match and split the result into real and nominal components by
/// the inflation-linkage fraction
pub fn proxy_schedule(
    profiles: &ProxyProfiles,
    target_duration: f64,
    inflation_linkage: f64,
    discount_day0: &[f64],
) -> Result<CashflowSchedule, AlmError> {
    let blended = match_duration(profiles, target_duration, discount_day0)?;

    let real: Vec<f64> = blended.iter().map(|&cf| inflation_linkage * cf).collect();
    let nominal: Vec<f64> = blended
        .iter()
        .map(|&cf| (1.0 - inflation_linkage) * cf)
        .collect();

    CashflowSchedule::new(nominal, real)
}
