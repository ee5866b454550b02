//! Calculation error model.

use iceerp_core::ItemId;
use thiserror::Error;

pub type CostingResult<T> = Result<T, CostingError>;

/// Typed failure of a cost calculation.
///
/// Every variant is recoverable at the call site; nothing here is fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CostingError {
    /// Malformed numeric field (negative, NaN, infinite) or inconsistent inputs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No positive divisor was available for a per-unit computation.
    #[error("no valid divisor: {0}")]
    ZeroDivisor(String),

    /// A finished good that needs costing has no ingredient lines.
    #[error("bill of materials for {0} has no ingredient lines")]
    EmptyBillOfMaterials(ItemId),
}

impl CostingError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn zero_divisor(msg: impl Into<String>) -> Self {
        Self::ZeroDivisor(msg.into())
    }
}

/// Require `value` to be finite and `>= 0`.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> CostingResult<f64> {
    if !value.is_finite() {
        return Err(CostingError::invalid(format!("{field} must be finite (got {value})")));
    }
    if value < 0.0 {
        return Err(CostingError::invalid(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}
