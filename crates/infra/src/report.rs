//! Reconciliation report: one finished good, one date window, every batch.
//!
//! Batch-level calculation failures are kept in the report as entries; only a
//! failure to read from the gateway aborts the whole run.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::{
    BillOfMaterials, DiscrepancyStatus, ProductionBatch, ReconciliationPolicy,
    ReconciliationResult, reconcile,
};

use crate::gateway::{CostingGateway, GatewayError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryOutcome {
    Reconciled(ReconciliationResult),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub batch_id: BatchId,
    pub produced_at: Option<DateTime<Utc>>,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub batches: usize,
    pub matched: usize,
    pub flagged: usize,
    pub failed: usize,
    /// Σ recorded cost − expected cost over reconciled batches.
    pub total_difference: f64,
    /// Σ |rounding drift| over reconciled batches.
    pub total_absolute_drift: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub finished_good_id: ItemId,
    pub range: DateRange,
    pub policy: ReconciliationPolicy,
    pub entries: Vec<ReportEntry>,
    pub summary: ReportSummary,
}

impl ReconciliationReport {
    /// Reconcile every batch of `finished_good_id` produced inside `range`.
    #[tracing::instrument(skip_all, fields(%finished_good_id, %range))]
    pub async fn run<G>(
        gateway: &G,
        finished_good_id: ItemId,
        range: DateRange,
        policy: ReconciliationPolicy,
    ) -> Result<Self, GatewayError>
    where
        G: CostingGateway + ?Sized,
    {
        let bom = gateway.get_bill_of_materials(finished_good_id).await?;
        let batches = gateway.list_production_batches(finished_good_id, range).await?;
        tracing::info!(
            lines = bom.lines().len(),
            batches = batches.len(),
            "reconciling production batches"
        );
        Ok(Self::build(finished_good_id, range, policy, &bom, &batches))
    }

    /// Reconcile a single batch against its finished good's recipe.
    #[tracing::instrument(skip_all, fields(%batch_id))]
    pub async fn for_batch<G>(
        gateway: &G,
        batch_id: BatchId,
        policy: ReconciliationPolicy,
    ) -> Result<Self, GatewayError>
    where
        G: CostingGateway + ?Sized,
    {
        let batch = gateway.get_production_batch(batch_id).await?;
        let bom = gateway.get_bill_of_materials(batch.finished_good_id).await?;
        Ok(Self::build(
            batch.finished_good_id,
            DateRange::unbounded(),
            policy,
            &bom,
            std::slice::from_ref(&batch),
        ))
    }

    /// Assemble a report from already-fetched rows.
    pub fn build(
        finished_good_id: ItemId,
        range: DateRange,
        policy: ReconciliationPolicy,
        bom: &BillOfMaterials,
        batches: &[ProductionBatch],
    ) -> Self {
        let mut entries: Vec<ReportEntry> = batches
            .iter()
            .map(|batch| {
                let outcome = match reconcile(bom, batch, &policy) {
                    Ok(result) => {
                        if !result.is_matched() {
                            tracing::info!(
                                batch_id = %batch.id,
                                difference = result.difference,
                                status = ?result.status,
                                "cost discrepancy"
                            );
                        }
                        EntryOutcome::Reconciled(result)
                    }
                    Err(e) => {
                        tracing::warn!(batch_id = %batch.id, error = %e, "batch not reconciled");
                        EntryOutcome::Failed { error: e.to_string() }
                    }
                };
                ReportEntry {
                    batch_id: batch.id,
                    produced_at: batch.produced_at,
                    outcome,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.produced_at.cmp(&b.produced_at).then(a.batch_id.cmp(&b.batch_id)));

        let summary = summarize(&entries);
        Self {
            finished_good_id,
            range,
            policy,
            entries,
            summary,
        }
    }

    pub fn has_discrepancies(&self) -> bool {
        self.summary.flagged > 0 || self.summary.failed > 0
    }
}

fn summarize(entries: &[ReportEntry]) -> ReportSummary {
    entries.iter().fold(
        ReportSummary {
            batches: entries.len(),
            ..ReportSummary::default()
        },
        |mut acc, entry| {
            match &entry.outcome {
                EntryOutcome::Reconciled(result) => {
                    if result.is_matched() {
                        acc.matched += 1;
                    } else {
                        acc.flagged += 1;
                    }
                    acc.total_difference += result.difference;
                    acc.total_absolute_drift += result.rounding.drift.abs();
                }
                EntryOutcome::Failed { .. } => acc.failed += 1,
            }
            acc
        },
    )
}

impl core::fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let rounding = &self.policy.rounding;
        let money = |v: f64| rounding.display_amount(v);

        writeln!(f, "finished good {} ({})", self.finished_good_id, self.range)?;
        writeln!(
            f,
            "{:<36}  {:<10}  {:>14}  {:>14}  {:>12}  {:>10}  {:>5}  status",
            "batch", "date", "expected", "recorded", "difference", "drift", "scale"
        )?;

        for entry in &self.entries {
            let date = entry
                .produced_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            match &entry.outcome {
                EntryOutcome::Reconciled(r) => writeln!(
                    f,
                    "{:<36}  {:<10}  {:>14}  {:>14}  {:>12}  {:>10}  {:>5}  {}",
                    entry.batch_id,
                    date,
                    money(r.expected_total_cost),
                    money(r.recorded_cost),
                    money(r.difference),
                    rounding.display(r.rounding.drift),
                    r.inferred_scale,
                    status_label(r.status),
                )?,
                EntryOutcome::Failed { error } => {
                    writeln!(f, "{:<36}  {:<10}  error: {}", entry.batch_id, date, error)?
                }
            }
        }

        let s = &self.summary;
        write!(
            f,
            "{} batches: {} matched, {} flagged, {} failed; net difference {}, total drift {}",
            s.batches,
            s.matched,
            s.flagged,
            s.failed,
            money(s.total_difference),
            rounding.display(s.total_absolute_drift),
        )
    }
}

fn status_label(status: DiscrepancyStatus) -> &'static str {
    match status {
        DiscrepancyStatus::Matched => "ok",
        DiscrepancyStatus::OverRecorded => "over",
        DiscrepancyStatus::UnderRecorded => "under",
    }
}
