//! Command-line surface.
//!
//! Every setting also reads its `ICEERP_*` environment variable; flags win.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use iceerp_core::{BatchId, DateRange, ItemId};
use iceerp_costing::ReconciliationPolicy;
use iceerp_infra::config::{
    BACKEND_KEY_VAR, BACKEND_URL_VAR, DISPLAY_SCALE_VAR, TOLERANCE_VAR, UNIT_COST_SCALE_VAR,
    policy_from_lookup,
};
use iceerp_infra::{BackendConfig, ConfigError, CostingGateway, InMemoryGateway, RestGateway};

#[derive(Debug, Parser)]
#[command(name = "iceerp-recon")]
#[command(about = "Reconcile recorded production costs against recipe costs")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with status 2 when any batch is flagged or failed
    #[arg(long)]
    pub fail_on_discrepancy: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile every batch of a finished good inside a date window
    Report {
        /// Finished-good item id
        #[arg(long)]
        finished_good: ItemId,

        /// First production date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// First production date excluded (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Reconcile a single production batch
    Batch {
        /// Production batch id
        #[arg(long)]
        batch: BatchId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Base URL of the hosted backend
    #[arg(long, env = "ICEERP_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// API key for the hosted backend
    #[arg(long, env = "ICEERP_BACKEND_KEY", hide_env_values = true)]
    pub backend_key: Option<String>,

    /// Read rows from a JSON fixtures file instead of the backend (takes precedence)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Decimal places unit costs are stored at [default: 6]
    #[arg(long, env = "ICEERP_UNIT_COST_SCALE")]
    pub unit_cost_scale: Option<String>,

    /// Decimal places totals are displayed at [default: 2]
    #[arg(long, env = "ICEERP_DISPLAY_SCALE")]
    pub display_scale: Option<String>,

    /// Largest difference still reported as matched [default: 0.01]
    #[arg(long, env = "ICEERP_TOLERANCE")]
    pub tolerance: Option<String>,
}

impl PolicyArgs {
    pub fn resolve(&self) -> Result<ReconciliationPolicy, ConfigError> {
        policy_from_lookup(|name| match name {
            UNIT_COST_SCALE_VAR => self.unit_cost_scale.clone(),
            DISPLAY_SCALE_VAR => self.display_scale.clone(),
            TOLERANCE_VAR => self.tolerance.clone(),
            _ => None,
        })
    }
}

impl SourceArgs {
    pub fn gateway(&self) -> anyhow::Result<Arc<dyn CostingGateway>> {
        if let Some(path) = &self.fixtures {
            if self.backend_url.is_some() {
                tracing::debug!("backend URL ignored in favour of fixtures");
            }
            tracing::info!(path = %path.display(), "using fixtures");
            return Ok(Arc::new(InMemoryGateway::load(path)?));
        }

        let config = BackendConfig::from_lookup(|name| match name {
            BACKEND_URL_VAR => self.backend_url.clone(),
            BACKEND_KEY_VAR => self.backend_key.clone(),
            _ => None,
        })?;
        tracing::info!(backend = %config.base_url, "using hosted backend");
        Ok(Arc::new(RestGateway::new(config)?))
    }
}

impl Command {
    pub fn range(&self) -> Result<DateRange, iceerp_core::DomainError> {
        match self {
            Command::Report { from, to, .. } => DateRange::new(*from, *to),
            Command::Batch { .. } => Ok(DateRange::unbounded()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FG: &str = "0192f3a4-5b6c-7d8e-9fa0-b1c2d3e4f506";

    #[test]
    fn parses_report_with_range() {
        let cli = Cli::try_parse_from([
            "iceerp-recon",
            "--fixtures",
            "rows.json",
            "report",
            "--finished-good",
            FG,
            "--from",
            "2024-05-01",
            "--to",
            "2024-06-01",
        ])
        .unwrap();

        let range = cli.command.range().unwrap();
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(range.to, NaiveDate::from_ymd_opt(2024, 6, 1));
        match cli.command {
            Command::Report { finished_good, .. } => assert_eq!(finished_good.to_string(), FG),
            other => panic!("Expected report command, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = Cli::try_parse_from(["iceerp-recon", "batch", "--batch", "nope"]);
        assert!(err.is_err());
    }

    #[test]
    fn inverted_range_is_a_domain_error() {
        let cli = Cli::try_parse_from([
            "iceerp-recon",
            "report",
            "--finished-good",
            FG,
            "--from",
            "2024-06-01",
            "--to",
            "2024-05-01",
        ])
        .unwrap();
        assert!(cli.command.range().is_err());
    }

    #[test]
    fn policy_flags_feed_the_config_layer() {
        let cli = Cli::try_parse_from([
            "iceerp-recon",
            "--unit-cost-scale",
            "4",
            "--tolerance",
            "0.05",
            "--format",
            "json",
            "batch",
            "--batch",
            FG,
        ])
        .unwrap();

        let policy = cli.policy.resolve().unwrap();
        assert_eq!(policy.rounding.unit_cost_scale, 4);
        assert_eq!(policy.tolerance.to_string(), "0.05");
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn fixtures_win_over_backend_url_from_env() {
        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe { std::env::set_var("ICEERP_BACKEND_URL", "https://ice.example.co") };
        let parsed = Cli::try_parse_from(["iceerp-recon", "--fixtures", "rows.json", "batch", "--batch", FG]);
        unsafe { std::env::remove_var("ICEERP_BACKEND_URL") };

        let cli = parsed.unwrap();
        assert_eq!(cli.source.fixtures, Some(PathBuf::from("rows.json")));
        assert_eq!(cli.source.backend_url.as_deref(), Some("https://ice.example.co"));
    }

    #[test]
    fn fixtures_gateway_is_chosen_even_with_backend_url() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/fixtures.json");
        let source = SourceArgs {
            backend_url: Some("https://ice.example.co".to_string()),
            backend_key: None,
            fixtures: Some(PathBuf::from(path)),
        };
        assert!(source.gateway().is_ok());

        let missing = SourceArgs {
            backend_url: Some("https://ice.example.co".to_string()),
            backend_key: None,
            fixtures: Some(PathBuf::from("/nonexistent/rows.json")),
        };
        assert!(missing.gateway().is_err());
    }
}
