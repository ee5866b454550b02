use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use iceerp_core::{BatchId, Entity, ItemId};

use crate::bom::QuantityBasis;
use crate::error::{CostingError, CostingResult, ensure_non_negative};

/// One production run of a finished good, as recorded at production time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub id: BatchId,
    pub finished_good_id: ItemId,
    /// Units produced or raw input consumed, depending on `basis`.
    pub input_quantity: f64,
    /// Cost recorded when the batch was logged.
    pub estimated_cost: f64,
    /// Measured output weight; preferred over `input_quantity` as a unit-cost divisor.
    #[serde(default)]
    pub output_weight: Option<f64>,
    #[serde(default)]
    pub produced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub basis: QuantityBasis,
}

impl ProductionBatch {
    pub fn new(
        id: BatchId,
        finished_good_id: ItemId,
        input_quantity: f64,
        estimated_cost: f64,
    ) -> Self {
        Self {
            id,
            finished_good_id,
            input_quantity,
            estimated_cost,
            output_weight: None,
            produced_at: None,
            basis: QuantityBasis::default(),
        }
    }

    pub fn with_output_weight(mut self, weight: f64) -> Self {
        self.output_weight = Some(weight);
        self
    }

    pub fn produced_at(mut self, at: DateTime<Utc>) -> Self {
        self.produced_at = Some(at);
        self
    }

    pub fn with_basis(mut self, basis: QuantityBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Every numeric field must be finite and non-negative.
    ///
    /// Zero quantities pass here; whether they are usable depends on the
    /// computation requested.
    pub fn validate(&self) -> CostingResult<()> {
        ensure_non_negative("input_quantity", self.input_quantity)?;
        ensure_non_negative("estimated_cost", self.estimated_cost)?;
        if let Some(weight) = self.output_weight {
            ensure_non_negative("output_weight", weight)?;
        }
        Ok(())
    }

    /// Divisor for per-unit costs: a positive output weight, else a positive input quantity.
    pub fn divisor(&self) -> CostingResult<f64> {
        match self.output_weight {
            Some(weight) if weight.is_finite() && weight > 0.0 => Ok(weight),
            _ if self.input_quantity.is_finite() && self.input_quantity > 0.0 => {
                Ok(self.input_quantity)
            }
            _ => Err(CostingError::zero_divisor(format!(
                "batch {} has neither a positive output weight nor a positive input quantity",
                self.id
            ))),
        }
    }
}

impl Entity for ProductionBatch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
