//! Recipe-cost reconciliation (pure, deterministic).
//!
//! Given a finished good's bill of materials and a production batch, this crate
//! recomputes the expected material cost, compares it with the cost recorded at
//! production time, and models the drift introduced when a derived unit price
//! is stored in a fixed-scale numeric column and multiplied back out.
//!
//! No IO, no logging, no retries: every operation returns a typed
//! [`CostingError`] for the caller to report.

pub mod batch;
pub mod bom;
pub mod error;
pub mod reconcile;
pub mod rounding;

pub use batch::ProductionBatch;
pub use bom::{BillOfMaterials, IngredientContribution, IngredientLine, QuantityBasis};
pub use error::{CostingError, CostingResult};
pub use reconcile::{
    DiscrepancyStatus, ReconciliationPolicy, ReconciliationResult, expected_total_cost, reconcile,
    unit_cost_of_output,
};
pub use rounding::{
    DEFAULT_DISPLAY_SCALE, DEFAULT_UNIT_COST_SCALE, RoundingDrift, RoundingPolicy, infer_scale,
};
