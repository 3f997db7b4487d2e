//! Error types for the pay engine.
//!
//! The core is pure computation, so the taxonomy is narrow: inputs that
//! fall outside their plausible range, staff pools that cannot be
//! simulated, and lookups of tax law that is not loaded.  Degenerate
//! simulation states (nobody eligible for a shift) are *not* errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayError {
    #[error("{field} must be {expected} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("invalid staff pool: {0}")]
    InvalidStaffPool(String),
    #[error("trials must be greater than 0")]
    TrialsZero,
    #[error("trials must not exceed {max} (got {requested})")]
    TooManyTrials { requested: usize, max: usize },
    #[error("total_staff must not exceed {max} (got {requested})")]
    TooManyStaff { requested: usize, max: usize },
    #[error("simulation needs {draws} shift draws, more than the limit of {max}")]
    SimulationTooLarge { draws: u64, max: u64 },
    #[error("unknown tax law '{0}'")]
    UnknownTaxLaw(String),
}

pub type Result<T> = std::result::Result<T, PayError>;

/// Checks that `value` is finite and inside `[min, max]`.
pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(PayError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PayError::OutOfRange {
            field,
            value,
            expected: "greater than 0",
        })
    }
}
