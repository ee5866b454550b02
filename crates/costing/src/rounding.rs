//! Fixed-scale rounding, the way a `numeric(p, s)` column stores values.
//!
//! A derived unit price (total ÷ weight) rarely has a finite decimal expansion.
//! Once it is stored at a fixed scale and multiplied back by the weight, the
//! reverse total no longer equals the original total. [`RoundingPolicy`] makes
//! that drift explicit.

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use iceerp_core::ValueObject;

use crate::error::{CostingError, CostingResult};

/// Scale of the unit-cost column in the store (observed storage truncation).
pub const DEFAULT_UNIT_COST_SCALE: u32 = 6;

/// Scale used when showing money (currency display convention).
pub const DEFAULT_DISPLAY_SCALE: u32 = 2;

/// Largest scale `rust_decimal` can represent.
const MAX_SCALE: u32 = 28;

/// Rounding configuration.
///
/// - `unit_cost_scale = 6`: matches the truncation observed in storage.
/// - `display_scale = 2`: matches the currency display convention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub unit_cost_scale: u32,
    pub display_scale: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            unit_cost_scale: DEFAULT_UNIT_COST_SCALE,
            display_scale: DEFAULT_DISPLAY_SCALE,
        }
    }
}

impl ValueObject for RoundingPolicy {}

/// What storing a unit cost at fixed scale does to the batch total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingDrift {
    /// Unit cost as the column would hold it.
    pub stored_unit_cost: Decimal,
    pub divisor: Decimal,
    /// `stored_unit_cost × divisor`.
    pub reverse_total: Decimal,
    /// `reverse_total − original total`.
    pub drift: Decimal,
    /// `drift` rounded to display scale.
    pub display_drift: Decimal,
}

impl ValueObject for RoundingDrift {}

impl RoundingPolicy {
    pub fn new(unit_cost_scale: u32, display_scale: u32) -> CostingResult<Self> {
        for (name, scale) in [("unit_cost_scale", unit_cost_scale), ("display_scale", display_scale)] {
            if scale > MAX_SCALE {
                return Err(CostingError::invalid(format!(
                    "{name} must be at most {MAX_SCALE} (got {scale})"
                )));
            }
        }
        Ok(Self {
            unit_cost_scale,
            display_scale,
        })
    }

    /// Round a unit cost to storage scale (half away from zero, like `numeric`).
    pub fn store(&self, unit_cost: f64) -> CostingResult<Decimal> {
        self.store_field("unit_cost", unit_cost)
    }

    fn store_field(&self, field: &str, value: f64) -> CostingResult<Decimal> {
        let value = to_decimal(field, value)?;
        Ok(value.round_dp_with_strategy(self.unit_cost_scale, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn display_round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.display_scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Render at display scale, zero-padded (`6000.001` → `"6000.00"`).
    pub fn display(&self, value: Decimal) -> String {
        format!("{:.*}", self.display_scale as usize, self.display_round(value))
    }

    /// A float amount rounded to display scale, or `None` outside the fixed-scale range.
    pub fn round_amount(&self, value: f64) -> Option<Decimal> {
        to_decimal("amount", value).ok().map(|d| self.display_round(d))
    }

    /// Render a float amount the same way [`display`](Self::display) renders decimals.
    ///
    /// Amounts beyond the fixed-scale range fall back to plain float formatting.
    pub fn display_amount(&self, value: f64) -> String {
        match self.round_amount(value) {
            Some(rounded) => format!("{:.*}", self.display_scale as usize, rounded),
            None => format!("{:.*}", self.display_scale as usize, value),
        }
    }

    /// Store `unit_cost`, multiply it back by `divisor`, and compare with `original_total`.
    pub fn rounding_drift(
        &self,
        unit_cost: f64,
        divisor: f64,
        original_total: f64,
    ) -> CostingResult<RoundingDrift> {
        let stored_unit_cost = self.store_field("unit_cost_of_output", unit_cost)?;
        let divisor = to_decimal("divisor", divisor)?;
        let original_total = to_decimal("original_total", original_total)?;

        let reverse_total = stored_unit_cost
            .checked_mul(divisor)
            .ok_or_else(|| CostingError::invalid("reverse total overflows decimal range"))?;
        let drift = reverse_total
            .checked_sub(original_total)
            .ok_or_else(|| CostingError::invalid("drift overflows decimal range"))?;

        Ok(RoundingDrift {
            stored_unit_cost,
            divisor,
            reverse_total,
            drift,
            display_drift: self.display_round(drift),
        })
    }
}

/// Convert through the shortest round-trip decimal text of `value`.
///
/// `0.1_f64` becomes exactly `0.1`, not its binary expansion.
pub(crate) fn to_decimal(field: &str, value: f64) -> CostingResult<Decimal> {
    if !value.is_finite() {
        return Err(CostingError::invalid(format!("{field} must be finite (got {value})")));
    }
    Decimal::from_str(&value.to_string()).map_err(|_| {
        CostingError::invalid(format!("{field} {value} exceeds fixed-scale range"))
    })
}

/// Largest count of fractional digits among `values` (trailing zeros ignored).
///
/// Applied to stored monetary values this reveals the scale the store kept
/// them at: `[300.0, 0.857143]` → `6`. Counted on the shortest round-trip
/// text, so it is not capped by the decimal type's scale.
pub fn infer_scale(values: impl IntoIterator<Item = f64>) -> CostingResult<u32> {
    values.into_iter().try_fold(0, |scale: u32, value| -> CostingResult<u32> {
        if !value.is_finite() {
            return Err(CostingError::invalid(format!(
                "stored value must be finite (got {value})"
            )));
        }
        // f64 `Display` never uses exponent notation.
        let text = value.to_string();
        let digits = text
            .split_once('.')
            .map_or(0, |(_, frac)| frac.trim_end_matches('0').len() as u32);
        Ok(scale.max(digits))
    })
}
