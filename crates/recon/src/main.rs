//! `iceerp-recon`: reconciliation report over the hosted store or fixtures.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use iceerp_infra::ReconciliationReport;

use crate::cli::{Cli, Command, OutputFormat};

const EXIT_DISCREPANCY: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    iceerp_observability::init();

    let cli = Cli::parse();
    let policy = cli.policy.resolve().context("invalid reconciliation settings")?;
    let range = cli.command.range()?;
    let gateway = cli.source.gateway()?;

    let report = match &cli.command {
        Command::Report { finished_good, .. } => {
            ReconciliationReport::run(gateway.as_ref(), *finished_good, range, policy).await
        }
        Command::Batch { batch } => {
            ReconciliationReport::for_batch(gateway.as_ref(), *batch, policy).await
        }
    }
    .context("failed to read from the backend")?;

    match cli.format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    tracing::info!(
        batches = report.summary.batches,
        matched = report.summary.matched,
        flagged = report.summary.flagged,
        failed = report.summary.failed,
        "report complete"
    );

    if cli.fail_on_discrepancy && report.has_discrepancies() {
        return Ok(ExitCode::from(EXIT_DISCREPANCY));
    }
    Ok(ExitCode::SUCCESS)
}
