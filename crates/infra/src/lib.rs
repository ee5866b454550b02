//! Infrastructure layer: backend gateways, configuration, reconciliation reports.
//!
//! The costing calculator is pure; everything that talks to the hosted store,
//! reads the environment, or logs lives here.

pub mod config;
pub mod gateway;
pub mod report;

pub use config::{BackendConfig, ConfigError, policy_from_lookup};
pub use gateway::{CostingGateway, GatewayError, InMemoryGateway, RestGateway};
pub use report::{EntryOutcome, ReconciliationReport, ReportEntry, ReportSummary};
