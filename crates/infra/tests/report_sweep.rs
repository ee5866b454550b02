//! Black-box report runs against fixture data.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::ReconciliationPolicy;
use iceerp_infra::gateway::Fixtures;
use iceerp_infra::{CostingGateway, EntryOutcome, GatewayError, InMemoryGateway, ReconciliationReport};

struct Ids {
    cone: ItemId,
    cream: ItemId,
    wafer: ItemId,
    may_a: BatchId,
    may_b: BatchId,
    june: BatchId,
}

fn ids() -> Ids {
    Ids {
        cone: ItemId::new(),
        cream: ItemId::new(),
        wafer: ItemId::new(),
        may_a: BatchId::new(),
        may_b: BatchId::new(),
        june: BatchId::new(),
    }
}

fn fixtures(ids: &Ids) -> Fixtures {
    serde_json::from_value(json!({
        "items": [
            { "id": ids.cone, "name": "cone", "quantity_basis": "produced_units" },
            { "id": ids.cream, "name": "cream", "unit_cost": 2.5 },
            { "id": ids.wafer, "name": "wafer", "unit_cost": 0.4 }
        ],
        "recipes": [
            { "finished_good_id": ids.cone, "ingredient_id": ids.cream, "quantity_per_unit": 0.1 },
            { "finished_good_id": ids.cone, "ingredient_id": ids.wafer, "quantity_per_unit": 1 }
        ],
        "batches": [
            {
                "id": ids.may_b, "finished_good_id": ids.cone,
                "input_quantity": 100, "estimated_cost": 70, "output_weight": 12.5,
                "produced_at": "2024-05-20T08:00:00Z"
            },
            {
                "id": ids.may_a, "finished_good_id": ids.cone,
                "input_quantity": 100, "estimated_cost": 65,
                "produced_at": "2024-05-02T08:00:00Z"
            },
            {
                "id": ids.june, "finished_good_id": ids.cone,
                "input_quantity": 0, "estimated_cost": 10, "output_weight": 0,
                "produced_at": "2024-06-01T08:00:00Z"
            }
        ]
    }))
    .unwrap()
}

fn may() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 5, 1),
        NaiveDate::from_ymd_opt(2024, 6, 1),
    )
    .unwrap()
}

#[tokio::test]
async fn monthly_report_reconciles_batches_in_date_order() {
    let ids = ids();
    let gateway = InMemoryGateway::from_fixtures(fixtures(&ids));

    let report =
        ReconciliationReport::run(&gateway, ids.cone, may(), ReconciliationPolicy::default())
            .await
            .unwrap();

    let order: Vec<BatchId> = report.entries.iter().map(|e| e.batch_id).collect();
    assert_eq!(order, vec![ids.may_a, ids.may_b]);

    // 100 cones × (0.1 × 2.5 + 1 × 0.4) = 65
    match &report.entries[0].outcome {
        EntryOutcome::Reconciled(r) => {
            assert!((r.expected_total_cost - 65.0).abs() < 1e-9);
            assert!(r.is_matched());
        }
        other => panic!("Expected reconciled entry, got {other:?}"),
    }
    match &report.entries[1].outcome {
        EntryOutcome::Reconciled(r) => {
            assert!(!r.is_matched());
            assert_eq!(r.unit_cost_of_output, 70.0 / 12.5);
        }
        other => panic!("Expected reconciled entry, got {other:?}"),
    }

    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.summary.flagged, 1);
    assert_eq!(report.summary.failed, 0);
}

#[tokio::test]
async fn batch_without_divisor_is_reported_as_failed() {
    let ids = ids();
    let gateway = Arc::new(InMemoryGateway::from_fixtures(fixtures(&ids)));

    let report = ReconciliationReport::for_batch(&gateway, ids.june, ReconciliationPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 1);
    match &report.entries[0].outcome {
        EntryOutcome::Failed { error } => assert!(error.starts_with("no valid divisor")),
        other => panic!("Expected failed entry, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_finished_good_aborts_the_run() {
    let ids = ids();
    let gateway: Arc<dyn CostingGateway> = Arc::new(InMemoryGateway::from_fixtures(fixtures(&ids)));

    let err = ReconciliationReport::run(
        gateway.as_ref(),
        ItemId::new(),
        DateRange::unbounded(),
        ReconciliationPolicy::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn demo_fixtures_load_and_reconcile() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/fixtures.json");
    let gateway = InMemoryGateway::load(path).unwrap();
    let cone: ItemId = "0192f3a4-0000-7000-8000-000000000001".parse().unwrap();

    let report = ReconciliationReport::run(
        &gateway,
        cone,
        DateRange::unbounded(),
        ReconciliationPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.summary.batches, 2);
    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.summary.flagged, 1);

    let text = report.to_string();
    assert!(text.contains("6000.00"));
}

#[tokio::test]
async fn missing_fixtures_file_is_a_storage_error() {
    let err = InMemoryGateway::load("/nonexistent/fixtures.json").unwrap_err();
    assert!(matches!(err, GatewayError::Storage(_)));
}
