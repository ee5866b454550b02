//! Row shapes of the backend tables and their assembly into costing inputs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use iceerp_core::{BatchId, ItemId};
use iceerp_costing::{BillOfMaterials, IngredientLine, ProductionBatch, QuantityBasis};

use super::GatewayError;

/// Row of the `items` table (raw ingredients and finished goods alike).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_cost: Option<f64>,
    /// Only meaningful for finished goods: what their recipe quantities are per.
    #[serde(default)]
    pub quantity_basis: QuantityBasis,
}

/// Row of the `recipes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRow {
    pub finished_good_id: ItemId,
    pub ingredient_id: ItemId,
    pub quantity_per_unit: f64,
}

/// Row of the `production_batches` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub id: BatchId,
    pub finished_good_id: ItemId,
    pub input_quantity: f64,
    pub estimated_cost: f64,
    #[serde(default)]
    pub output_weight: Option<f64>,
    #[serde(default)]
    pub produced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quantity_basis: QuantityBasis,
}

impl From<BatchRow> for ProductionBatch {
    fn from(row: BatchRow) -> Self {
        ProductionBatch {
            id: row.id,
            finished_good_id: row.finished_good_id,
            input_quantity: row.input_quantity,
            estimated_cost: row.estimated_cost,
            output_weight: row.output_weight,
            produced_at: row.produced_at,
            basis: row.quantity_basis,
        }
    }
}

/// Join recipe lines with item costs.
///
/// An item without a recorded cost contributes zero and is logged; a recipe
/// line pointing at an unknown item is an error.
pub fn assemble_bill_of_materials(
    finished_good: &ItemRow,
    recipes: &[RecipeRow],
    items: &HashMap<ItemId, ItemRow>,
) -> Result<BillOfMaterials, GatewayError> {
    let mut bom = BillOfMaterials::new(finished_good.id, Vec::new())
        .with_basis(finished_good.quantity_basis);

    for row in recipes.iter().filter(|r| r.finished_good_id == finished_good.id) {
        let item = items.get(&row.ingredient_id).ok_or(GatewayError::MissingItem {
            finished_good_id: finished_good.id,
            ingredient_id: row.ingredient_id,
        })?;
        let unit_cost = item.unit_cost.unwrap_or_else(|| {
            tracing::warn!(
                finished_good_id = %finished_good.id,
                ingredient_id = %item.id,
                ingredient = %item.name,
                "ingredient has no unit cost; counting it as zero"
            );
            0.0
        });
        bom.push_line(IngredientLine::new(row.ingredient_id, row.quantity_per_unit, unit_cost));
    }

    Ok(bom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cost: Option<f64>) -> ItemRow {
        ItemRow {
            id: ItemId::new(),
            name: "cocoa".to_string(),
            unit_cost: cost,
            quantity_basis: QuantityBasis::default(),
        }
    }

    #[test]
    fn joins_recipe_with_item_costs() {
        let finished = item(None);
        let cocoa = item(Some(12.5));
        let recipes = vec![RecipeRow {
            finished_good_id: finished.id,
            ingredient_id: cocoa.id,
            quantity_per_unit: 0.2,
        }];
        let items = HashMap::from([(cocoa.id, cocoa.clone())]);

        let bom = assemble_bill_of_materials(&finished, &recipes, &items).unwrap();
        assert_eq!(bom.lines(), &[IngredientLine::new(cocoa.id, 0.2, 12.5)]);
    }

    #[test]
    fn missing_cost_counts_as_zero() {
        let finished = item(None);
        let free = item(None);
        let recipes = vec![RecipeRow {
            finished_good_id: finished.id,
            ingredient_id: free.id,
            quantity_per_unit: 1.0,
        }];
        let items = HashMap::from([(free.id, free.clone())]);

        let bom = assemble_bill_of_materials(&finished, &recipes, &items).unwrap();
        assert_eq!(bom.lines()[0].unit_cost, 0.0);
    }

    #[test]
    fn unknown_ingredient_is_an_error() {
        let finished = item(None);
        let recipes = vec![RecipeRow {
            finished_good_id: finished.id,
            ingredient_id: ItemId::new(),
            quantity_per_unit: 1.0,
        }];

        let err = assemble_bill_of_materials(&finished, &recipes, &HashMap::new()).unwrap_err();
        assert!(matches!(err, GatewayError::MissingItem { .. }));
    }

    #[test]
    fn batch_row_tolerates_missing_optional_columns() {
        let json = format!(
            r#"{{"id":"{}","finished_good_id":"{}","input_quantity":3,"estimated_cost":300}}"#,
            BatchId::new(),
            ItemId::new()
        );
        let row: BatchRow = serde_json::from_str(&json).unwrap();
        let batch = ProductionBatch::from(row);
        assert_eq!(batch.output_weight, None);
        assert_eq!(batch.basis, QuantityBasis::ProducedUnits);
        assert_eq!(batch.input_quantity, 3.0);
    }
}
