//! papertrail: India-focused research paper aggregator.
//! Entry point for the ingestion binary.

mod cli;
mod report;

use anyhow::Context;
use clap::Parser;
use papertrail_config::Config;
use papertrail_db::{Database, MemoryPaperStore, PaperRepository, PaperStore};
use papertrail_ingestion::{Orchestrator, RunOutcome};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("papertrail {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    info!(
        sources = config.sources.len(),
        cutoff = %config.cutoff_date,
        concurrency = config.http.concurrency,
        "Configuration loaded"
    );

    let orchestrator = Orchestrator::from_config(&config)?.with_scope(cli.scope.scope());

    let store: Box<dyn PaperStore> = if cli.dry_run {
        info!("Dry run: merging into an in-memory store");
        Box::new(MemoryPaperStore::new())
    } else {
        let db = Database::open(&config.database.path)
            .with_context(|| format!("opening database at {}", config.database.path))?;
        db.initialize()?;
        Box::new(PaperRepository::new(Arc::new(db)))
    };

    let summary = orchestrator.run(store.as_ref()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report::render(&summary));
    }

    if summary.outcome() == RunOutcome::NothingReachable {
        warn!("No source completed this run");
    }
    Ok(())
}
