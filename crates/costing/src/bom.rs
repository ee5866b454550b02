use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use iceerp_core::{Entity, ItemId, ValueObject};

use crate::error::{CostingError, CostingResult, ensure_non_negative};

/// What a batch quantity counts, and therefore what a recipe quantity is "per".
///
/// Recipes and batches both declare it; the calculator refuses to mix them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityBasis {
    /// Batch quantity = finished units produced; recipe quantities are per unit.
    #[default]
    ProducedUnits,
    /// Batch quantity = raw input consumed; recipe quantities are per unit of input.
    ConsumedInput,
}

impl core::fmt::Display for QuantityBasis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QuantityBasis::ProducedUnits => f.write_str("produced_units"),
            QuantityBasis::ConsumedInput => f.write_str("consumed_input"),
        }
    }
}

/// One recipe line: how much of an ingredient one unit needs, and what it costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub ingredient_id: ItemId,
    pub quantity_per_unit: f64,
    pub unit_cost: f64,
}

impl IngredientLine {
    pub fn new(ingredient_id: ItemId, quantity_per_unit: f64, unit_cost: f64) -> Self {
        Self {
            ingredient_id,
            quantity_per_unit,
            unit_cost,
        }
    }

    pub fn validate(&self) -> CostingResult<()> {
        ensure_non_negative(
            &format!("quantity_per_unit of {}", self.ingredient_id),
            self.quantity_per_unit,
        )?;
        ensure_non_negative(&format!("unit_cost of {}", self.ingredient_id), self.unit_cost)?;
        Ok(())
    }

    /// `quantity_per_unit × quantity × unit_cost`, multiplied in that order.
    pub fn contribution(&self, quantity: f64) -> f64 {
        self.quantity_per_unit * quantity * self.unit_cost
    }
}

impl ValueObject for IngredientLine {}

/// Cost share of one ingredient in a batch (duplicate lines merged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientContribution {
    pub ingredient_id: ItemId,
    pub quantity_per_unit: f64,
    pub amount: f64,
}

/// Recipe of one finished good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    finished_good_id: ItemId,
    #[serde(default)]
    basis: QuantityBasis,
    lines: Vec<IngredientLine>,
}

impl BillOfMaterials {
    pub fn new(finished_good_id: ItemId, lines: Vec<IngredientLine>) -> Self {
        Self {
            finished_good_id,
            basis: QuantityBasis::default(),
            lines,
        }
    }

    pub fn with_basis(mut self, basis: QuantityBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn push_line(&mut self, line: IngredientLine) {
        self.lines.push(line);
    }

    pub fn finished_good_id(&self) -> ItemId {
        self.finished_good_id
    }

    pub fn basis(&self) -> QuantityBasis {
        self.basis
    }

    pub fn lines(&self) -> &[IngredientLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reject an empty recipe first, then any malformed line.
    pub fn validate(&self) -> CostingResult<()> {
        if self.lines.is_empty() {
            return Err(CostingError::EmptyBillOfMaterials(self.finished_good_id));
        }
        self.lines.iter().try_for_each(IngredientLine::validate)
    }

    /// Per-ingredient contributions for a batch of `quantity`, ordered by ingredient id.
    pub fn contributions(&self, quantity: f64) -> Vec<IngredientContribution> {
        let mut merged: BTreeMap<ItemId, IngredientContribution> = BTreeMap::new();
        for line in &self.lines {
            let entry = merged
                .entry(line.ingredient_id)
                .or_insert_with(|| IngredientContribution {
                    ingredient_id: line.ingredient_id,
                    quantity_per_unit: 0.0,
                    amount: 0.0,
                });
            entry.quantity_per_unit += line.quantity_per_unit;
            entry.amount += line.contribution(quantity);
        }
        merged.into_values().collect()
    }

    /// Unit costs as stored in the item table, for scale inference.
    pub fn unit_costs(&self) -> impl Iterator<Item = f64> + '_ {
        self.lines.iter().map(|l| l.unit_cost)
    }
}

impl Entity for BillOfMaterials {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.finished_good_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recipe_is_rejected_before_line_checks() {
        let id = ItemId::new();
        let bom = BillOfMaterials::new(id, vec![]);
        assert_eq!(bom.validate().unwrap_err(), CostingError::EmptyBillOfMaterials(id));
    }

    #[test]
    fn negative_quantity_is_invalid() {
        let bom = BillOfMaterials::new(
            ItemId::new(),
            vec![IngredientLine::new(ItemId::new(), -1.0, 10.0)],
        );
        match bom.validate().unwrap_err() {
            CostingError::InvalidInput(msg) => assert!(msg.contains("quantity_per_unit")),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn nan_unit_cost_is_invalid() {
        let line = IngredientLine::new(ItemId::new(), 1.0, f64::NAN);
        assert!(matches!(line.validate(), Err(CostingError::InvalidInput(_))));
    }

    #[test]
    fn duplicate_ingredients_sum_their_contributions() {
        let sugar = ItemId::new();
        let milk = ItemId::new();
        let bom = BillOfMaterials::new(
            ItemId::new(),
            vec![
                IngredientLine::new(sugar, 2.0, 5.0),
                IngredientLine::new(milk, 1.0, 3.0),
                IngredientLine::new(sugar, 1.0, 5.0),
            ],
        );

        let contributions = bom.contributions(4.0);
        assert_eq!(contributions.len(), 2);

        let sugar_share = contributions.iter().find(|c| c.ingredient_id == sugar).unwrap();
        assert_eq!(sugar_share.quantity_per_unit, 3.0);
        assert_eq!(sugar_share.amount, 60.0);

        let milk_share = contributions.iter().find(|c| c.ingredient_id == milk).unwrap();
        assert_eq!(milk_share.amount, 12.0);
    }

    #[test]
    fn basis_defaults_to_produced_units_when_absent_from_json() {
        let id = ItemId::new();
        let json = format!(r#"{{"finished_good_id":"{id}","lines":[]}}"#);
        let bom: BillOfMaterials = serde_json::from_str(&json).unwrap();
        assert_eq!(bom.basis(), QuantityBasis::ProducedUnits);
        assert_eq!(bom.id(), &id);
    }
}
