//! Gateway over the hosted backend's REST interface (PostgREST conventions).
//!
//! Filters are query parameters of the form `column=op.value`; rows come back
//! as JSON arrays.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::{BillOfMaterials, ProductionBatch};

use super::rows::{BatchRow, ItemRow, RecipeRow, assemble_bill_of_materials};
use super::{CostingGateway, GatewayError};
use crate::config::BackendConfig;

const ITEMS: &str = "items";
const RECIPES: &str = "recipes";
const BATCHES: &str = "production_batches";

pub struct RestGateway {
    client: reqwest::Client,
    config: BackendConfig,
}

impl RestGateway {
    pub fn new(config: BackendConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let url = self.table_url(table);
        let mut req = self.client.get(&url).query(&[("select", "*")]).query(query);

        if let Some(key) = &self.config.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }

        tracing::debug!(table, ?query, "querying backend");
        let resp = req.send().await.map_err(|e| GatewayError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(GatewayError::Api(status, resp.text().await.unwrap_or_default()));
        }

        resp.json::<Vec<T>>()
            .await
            .map_err(|e| GatewayError::Parse(format!("{table}: {e}")))
    }
}

fn eq(column: &'static str, value: impl core::fmt::Display) -> (&'static str, String) {
    (column, format!("eq.{value}"))
}

fn in_list(column: &'static str, ids: &[ItemId]) -> (&'static str, String) {
    let joined = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
    (column, format!("in.({joined})"))
}

fn batch_query(finished_good_id: ItemId, range: &DateRange) -> Vec<(&'static str, String)> {
    let mut query = vec![eq("finished_good_id", finished_good_id)];
    if let Some(from) = range.from_instant() {
        query.push(("produced_at", format!("gte.{}", from.to_rfc3339())));
    }
    if let Some(to) = range.to_instant() {
        query.push(("produced_at", format!("lt.{}", to.to_rfc3339())));
    }
    query.push(("order", "produced_at.asc,id.asc".to_string()));
    query
}

#[async_trait::async_trait]
impl CostingGateway for RestGateway {
    async fn get_bill_of_materials(
        &self,
        finished_good_id: ItemId,
    ) -> Result<BillOfMaterials, GatewayError> {
        let finished_good: ItemRow = self
            .select(ITEMS, &[eq("id", finished_good_id)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("item {finished_good_id}")))?;

        let recipes: Vec<RecipeRow> = self
            .select(RECIPES, &[eq("finished_good_id", finished_good_id)])
            .await?;

        let mut ingredient_ids: Vec<ItemId> = recipes.iter().map(|r| r.ingredient_id).collect();
        ingredient_ids.sort();
        ingredient_ids.dedup();

        let items: HashMap<ItemId, ItemRow> = if ingredient_ids.is_empty() {
            HashMap::new()
        } else {
            self.select::<ItemRow>(ITEMS, &[in_list("id", &ingredient_ids)])
                .await?
                .into_iter()
                .map(|i| (i.id, i))
                .collect()
        };

        assemble_bill_of_materials(&finished_good, &recipes, &items)
    }

    async fn get_production_batch(
        &self,
        batch_id: BatchId,
    ) -> Result<ProductionBatch, GatewayError> {
        self.select::<BatchRow>(BATCHES, &[eq("id", batch_id)])
            .await?
            .into_iter()
            .next()
            .map(ProductionBatch::from)
            .ok_or_else(|| GatewayError::NotFound(format!("production batch {batch_id}")))
    }

    async fn list_production_batches(
        &self,
        finished_good_id: ItemId,
        range: DateRange,
    ) -> Result<Vec<ProductionBatch>, GatewayError> {
        let rows: Vec<BatchRow> = self
            .select(BATCHES, &batch_query(finished_good_id, &range))
            .await?;
        Ok(rows.into_iter().map(ProductionBatch::from).collect())
    }
}
