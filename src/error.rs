//! Error and diagnostic types for ALM runs
//!
//! Fatal conditions (shape violations, missing inputs reached downstream,
//! solver divergence) are `AlmError` values and abort the run. Non-fatal
//! conditions accumulate as human-readable messages in a `Diagnostics`
//! collector that is returned alongside the computed results.

use crate::curves::CurveFamily;
use thiserror::Error;

/// Fatal error raised by the projection engine
#[derive(Debug, Error)]
pub enum AlmError {
    /// The scenario grid is missing a (Trial, Timestep) combination
    #[error("scenario grid is not a complete Trial x Timestep grid: missing trial {trial}, timestep {timestep}")]
    IncompleteGrid { trial: usize, timestep: usize },

    /// The scenario grid contains a (Trial, Timestep) combination twice
    #[error("scenario grid contains duplicate row for trial {trial}, timestep {timestep}")]
    DuplicateRow { trial: usize, timestep: usize },

    /// A tenor-indexed vector does not have the required width
    #[error("tenor width mismatch for {name}: expected {expected} points, got {actual}")]
    TenorWidth {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Margin table and base-curve table disagree on the number of bases
    #[error("discounting basis count mismatch: {margins} margin rows vs {bases} base curve names")]
    BasisCount { margins: usize, bases: usize },

    /// A named column is absent from the scenario grid
    #[error("scenario grid has no column named '{column}'")]
    MissingColumn { column: String },

    /// A curve family required downstream was never resolved
    #[error("curve family '{family}' is required but was not resolved from the scenario grid")]
    MissingFamily { family: CurveFamily },

    /// Two grids that must share dimensions do not
    #[error("grid shape mismatch: expected {expected_trials} trials x {expected_steps} timesteps, got {actual_trials} x {actual_steps}")]
    ShapeMismatch {
        expected_trials: usize,
        expected_steps: usize,
        actual_trials: usize,
        actual_steps: usize,
    },

    /// The duration-matching solver did not converge
    #[error("duration matching failed to converge after {iterations} iterations (residual {residual:.6})")]
    SolverDiverged { iterations: usize, residual: f64 },

    /// An input value or configuration is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// CSV parsing failure while loading tabular inputs
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while loading inputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric field failed to parse
    #[error("numeric parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// An integer field failed to parse
    #[error("integer parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

/// Per-run collector for non-fatal diagnostic messages
///
/// Stages that hit a recoverable condition (an unmapped curve family, an
/// undefined funding level) push a message here and carry on. The collector
/// is returned as part of the run output, never instead of it.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal condition
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.messages.push(message);
    }

    /// Absorb messages from another collector
    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_accumulate() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.push("first");
        diags.push(format!("second {}", 2));

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.messages()[0], "first");
    }

    #[test]
    fn test_error_messages_name_the_invariant() {
        let err = AlmError::TenorWidth {
            name: "margin for basis 'gilts'".to_string(),
            expected: 100,
            actual: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("margin for basis 'gilts'"));
    }
}
