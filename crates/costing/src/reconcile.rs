//! Expected-vs-recorded cost reconciliation of one production batch.
//!
//! Two calculations stay separate because they read different batch fields:
//! - the cost side multiplies recipe quantities by `input_quantity`
//!   ([`expected_total_cost`]);
//! - the per-unit side divides the recorded cost by the measured output
//!   weight when there is one ([`unit_cost_of_output`]).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use iceerp_core::{BatchId, ItemId};

use crate::batch::ProductionBatch;
use crate::bom::{BillOfMaterials, IngredientContribution};
use crate::error::{CostingError, CostingResult, ensure_non_negative};
use crate::rounding::{RoundingDrift, RoundingPolicy, infer_scale, to_decimal};

/// Rounding plus the tolerance under which a difference counts as matched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPolicy {
    pub rounding: RoundingPolicy,
    /// Largest absolute difference, after display rounding, still reported as
    /// `Matched` (default one cent).
    pub tolerance: Decimal,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            rounding: RoundingPolicy::default(),
            tolerance: Decimal::new(1, 2),
        }
    }
}

impl ReconciliationPolicy {
    pub fn new(rounding: RoundingPolicy, tolerance: Decimal) -> CostingResult<Self> {
        if tolerance.is_sign_negative() {
            return Err(CostingError::invalid(format!(
                "tolerance cannot be negative (got {tolerance})"
            )));
        }
        Ok(Self { rounding, tolerance })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyStatus {
    /// `|recorded − expected| <= tolerance` at display scale.
    Matched,
    /// Recorded cost exceeds the recomputed cost.
    OverRecorded,
    /// Recorded cost is below the recomputed cost.
    UnderRecorded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub batch_id: BatchId,
    pub finished_good_id: ItemId,
    pub expected_total_cost: f64,
    pub recorded_cost: f64,
    /// `recorded_cost − expected_total_cost`.
    pub difference: f64,
    /// `difference ÷ expected_total_cost`; absent when nothing was expected.
    pub relative_difference: Option<f64>,
    /// Fractional digits the store kept the monetary values at.
    pub inferred_scale: u32,
    pub contributions: Vec<IngredientContribution>,
    pub unit_cost_of_output: f64,
    pub rounding: RoundingDrift,
    pub status: DiscrepancyStatus,
}

impl ReconciliationResult {
    /// Relative difference, failing when the expected cost is zero.
    pub fn require_relative_difference(&self) -> CostingResult<f64> {
        self.relative_difference.ok_or_else(|| {
            CostingError::zero_divisor(format!(
                "expected cost of batch {} is zero; relative difference undefined",
                self.batch_id
            ))
        })
    }

    pub fn is_matched(&self) -> bool {
        self.status == DiscrepancyStatus::Matched
    }
}

/// Σ `quantity_per_unit × input_quantity × unit_cost` over the recipe.
pub fn expected_total_cost(bom: &BillOfMaterials, input_quantity: f64) -> CostingResult<f64> {
    bom.validate()?;
    ensure_non_negative("input_quantity", input_quantity)?;
    Ok(bom.lines().iter().map(|line| line.contribution(input_quantity)).sum())
}

/// Recorded cost per unit of output (output weight if positive, else input quantity).
pub fn unit_cost_of_output(batch: &ProductionBatch) -> CostingResult<f64> {
    batch.validate()?;
    let divisor = batch.divisor()?;
    Ok(batch.estimated_cost / divisor)
}

/// Recompute a batch's material cost and reconcile it against the recorded one.
pub fn reconcile(
    bom: &BillOfMaterials,
    batch: &ProductionBatch,
    policy: &ReconciliationPolicy,
) -> CostingResult<ReconciliationResult> {
    bom.validate()?;
    batch.validate()?;

    if bom.finished_good_id() != batch.finished_good_id {
        return Err(CostingError::invalid(format!(
            "batch {} produces {} but the recipe is for {}",
            batch.id,
            batch.finished_good_id,
            bom.finished_good_id()
        )));
    }
    if bom.basis() != batch.basis {
        return Err(CostingError::invalid(format!(
            "batch {} counts {} but the recipe of {} is per {}",
            batch.id,
            batch.basis,
            bom.finished_good_id(),
            bom.basis()
        )));
    }

    let divisor = batch.divisor()?;
    if batch.input_quantity == 0.0 {
        return Err(CostingError::invalid(format!(
            "batch {} has zero input quantity",
            batch.id
        )));
    }

    // The recorded cost is stored at fixed scale; reject what no column could hold.
    to_decimal("estimated_cost", batch.estimated_cost)?;

    let expected = expected_total_cost(bom, batch.input_quantity)?;
    let difference = batch.estimated_cost - expected;
    let relative_difference = (expected != 0.0).then(|| difference / expected);

    let unit_cost = unit_cost_of_output(batch)?;
    let rounding = policy
        .rounding
        .rounding_drift(unit_cost, divisor, batch.estimated_cost)?;

    let inferred_scale = infer_scale(bom.unit_costs().chain([batch.estimated_cost]))?;

    // Compared at display scale: float noise below a cent is not a discrepancy.
    // A difference beyond fixed-scale range is never within tolerance.
    let within_tolerance = policy
        .rounding
        .round_amount(difference)
        .is_some_and(|shown| shown.abs() <= policy.tolerance);
    let status = if within_tolerance {
        DiscrepancyStatus::Matched
    } else if difference > 0.0 {
        DiscrepancyStatus::OverRecorded
    } else {
        DiscrepancyStatus::UnderRecorded
    };

    Ok(ReconciliationResult {
        batch_id: batch.id,
        finished_good_id: batch.finished_good_id,
        expected_total_cost: expected,
        recorded_cost: batch.estimated_cost,
        difference,
        relative_difference,
        inferred_scale,
        contributions: bom.contributions(batch.input_quantity),
        unit_cost_of_output: unit_cost,
        rounding,
        status,
    })
}
