//! Access to the hosted store that owns items, recipes and production batches.
//!
//! Callers receive a [`CostingGateway`] explicitly instead of opening their own
//! client connection.

pub mod in_memory;
pub mod rest;
pub mod rows;

use std::sync::Arc;

use thiserror::Error;

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::{BillOfMaterials, ProductionBatch};

pub use in_memory::{Fixtures, InMemoryGateway};
pub use rest::RestGateway;
pub use rows::{BatchRow, ItemRow, RecipeRow};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("recipe of {finished_good_id} references unknown item {ingredient_id}")]
    MissingItem {
        finished_good_id: ItemId,
        ingredient_id: ItemId,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Read-only view of the rows a reconciliation needs.
#[async_trait::async_trait]
pub trait CostingGateway: Send + Sync {
    /// Recipe of a finished good with each ingredient's current unit cost.
    ///
    /// A finished good without recipe lines yields an empty bill of materials;
    /// deciding whether that is an error is the calculator's job.
    async fn get_bill_of_materials(
        &self,
        finished_good_id: ItemId,
    ) -> Result<BillOfMaterials, GatewayError>;

    async fn get_production_batch(&self, batch_id: BatchId)
    -> Result<ProductionBatch, GatewayError>;

    /// Batches of a finished good produced inside `range`, oldest first.
    async fn list_production_batches(
        &self,
        finished_good_id: ItemId,
        range: DateRange,
    ) -> Result<Vec<ProductionBatch>, GatewayError>;
}

#[async_trait::async_trait]
impl<G> CostingGateway for Arc<G>
where
    G: CostingGateway + ?Sized,
{
    async fn get_bill_of_materials(
        &self,
        finished_good_id: ItemId,
    ) -> Result<BillOfMaterials, GatewayError> {
        (**self).get_bill_of_materials(finished_good_id).await
    }

    async fn get_production_batch(
        &self,
        batch_id: BatchId,
    ) -> Result<ProductionBatch, GatewayError> {
        (**self).get_production_batch(batch_id).await
    }

    async fn list_production_batches(
        &self,
        finished_good_id: ItemId,
        range: DateRange,
    ) -> Result<Vec<ProductionBatch>, GatewayError> {
        (**self).list_production_batches(finished_good_id, range).await
    }
}
