//! Error kinds surfaced by the statistics and simulation core.
use thiserror::Error;

/// Failures raised by statistic computations and input handling.
///
/// `InsufficientData` is a defined "no result" state rather than a crash:
/// callers are expected to check for it before using a statistic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreakError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: &'static str },
}

impl StreakError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) const fn insufficient(reason: &'static str) -> Self {
        Self::InsufficientData { reason }
    }

    /// Whether this error marks an undefined statistic rather than bad input.
    #[must_use]
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Errors raised when player-model parameters violate their invariants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.4})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("lower threshold {lower:.2} exceeds upper threshold {upper:.2}")]
    ThresholdOrder { lower: f64, upper: f64 },
    #[error("recent window must cover at least one trial")]
    EmptyWindow,
    #[error("recent window of {window} needs {expected} table entries (got {actual})")]
    WindowTableLength {
        window: usize,
        expected: usize,
        actual: usize,
    },
    #[error("shot mixture is invalid: {reason}")]
    Mixture { reason: String },
    #[error("unknown model preset: {name}")]
    UnknownPreset { name: String },
}
