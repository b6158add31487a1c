//! Command-line arguments.

use clap::{Args, Parser};
use papertrail_ingestion::FetchScope;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "papertrail", version, about = "Collect India-focused research papers into one store")]
pub struct Cli {
    /// Configuration file (default: papertrail.toml).
    #[arg(short, long, env = "PAPERTRAIL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Fetch and filter, but merge into a throwaway in-memory store.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Debug logging unless RUST_LOG is set.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Default, Args)]
#[group(multiple = false)]
pub struct ScopeArgs {
    /// Only syndication feeds.
    #[arg(long)]
    pub feeds_only: bool,

    /// Only institution page scrapers.
    #[arg(long)]
    pub scrapes_only: bool,

    /// Only JSON listing endpoints.
    #[arg(long)]
    pub listings_only: bool,
}

impl ScopeArgs {
    pub fn scope(&self) -> FetchScope {
        if self.feeds_only {
            FetchScope::FeedsOnly
        } else if self.scrapes_only {
            FetchScope::ScrapesOnly
        } else if self.listings_only {
            FetchScope::ListingsOnly
        } else {
            FetchScope::All
        }
    }
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "papertrail=debug,info"
        } else {
            "papertrail=info,warn"
        }
    }
}
