use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::{BillOfMaterials, ProductionBatch};

use super::rows::{BatchRow, ItemRow, RecipeRow, assemble_bill_of_materials};
use super::{CostingGateway, GatewayError};

/// Snapshot of the three tables, as JSON fixtures or captured test data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub items: Vec<ItemRow>,
    #[serde(default)]
    pub recipes: Vec<RecipeRow>,
    #[serde(default)]
    pub batches: Vec<BatchRow>,
}

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, ItemRow>,
    recipes: Vec<RecipeRow>,
    batches: HashMap<BatchId, BatchRow>,
}

/// In-memory gateway for tests and offline runs against fixtures.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    inner: RwLock<Tables>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let tables = Tables {
            items: fixtures.items.into_iter().map(|i| (i.id, i)).collect(),
            recipes: fixtures.recipes,
            batches: fixtures.batches.into_iter().map(|b| (b.id, b)).collect(),
        };
        Self {
            inner: RwLock::new(tables),
        }
    }

    /// Load a JSON fixtures file (`{"items": [...], "recipes": [...], "batches": [...]}`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Storage(format!("{}: {e}", path.display())))?;
        let fixtures: Fixtures = serde_json::from_str(&raw)
            .map_err(|e| GatewayError::Parse(format!("{}: {e}", path.display())))?;
        tracing::debug!(
            path = %path.display(),
            items = fixtures.items.len(),
            recipes = fixtures.recipes.len(),
            batches = fixtures.batches.len(),
            "loaded fixtures"
        );
        Ok(Self::from_fixtures(fixtures))
    }

    pub fn upsert_item(&self, item: ItemRow) -> Result<(), GatewayError> {
        self.write()?.items.insert(item.id, item);
        Ok(())
    }

    pub fn add_recipe_line(&self, line: RecipeRow) -> Result<(), GatewayError> {
        self.write()?.recipes.push(line);
        Ok(())
    }

    pub fn upsert_batch(&self, batch: BatchRow) -> Result<(), GatewayError> {
        self.write()?.batches.insert(batch.id, batch);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, GatewayError> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, GatewayError> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> GatewayError {
    GatewayError::Storage("in-memory tables poisoned".to_string())
}

#[async_trait::async_trait]
impl CostingGateway for InMemoryGateway {
    async fn get_bill_of_materials(
        &self,
        finished_good_id: ItemId,
    ) -> Result<BillOfMaterials, GatewayError> {
        let tables = self.read()?;
        let finished_good = tables
            .items
            .get(&finished_good_id)
            .ok_or_else(|| GatewayError::NotFound(format!("item {finished_good_id}")))?;
        assemble_bill_of_materials(finished_good, &tables.recipes, &tables.items)
    }

    async fn get_production_batch(
        &self,
        batch_id: BatchId,
    ) -> Result<ProductionBatch, GatewayError> {
        let tables = self.read()?;
        tables
            .batches
            .get(&batch_id)
            .cloned()
            .map(ProductionBatch::from)
            .ok_or_else(|| GatewayError::NotFound(format!("production batch {batch_id}")))
    }

    async fn list_production_batches(
        &self,
        finished_good_id: ItemId,
        range: DateRange,
    ) -> Result<Vec<ProductionBatch>, GatewayError> {
        let tables = self.read()?;
        let mut batches: Vec<ProductionBatch> = tables
            .batches
            .values()
            .filter(|b| b.finished_good_id == finished_good_id && range.contains(b.produced_at))
            .cloned()
            .map(ProductionBatch::from)
            .collect();
        batches.sort_by(|a, b| a.produced_at.cmp(&b.produced_at).then(a.id.cmp(&b.id)));
        Ok(batches)
    }
}
