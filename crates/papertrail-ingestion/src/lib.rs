//! papertrail-ingestion: research paper discovery pipeline.
//! - Source fetchers (syndication feeds, institution scrapers, JSON listings)
//! - Identity, text and date normalisation
//! - Keyword relevance gate with institutional bypass
//! - Orchestrated runs merged into a `PaperStore`

pub mod models;
pub mod normalise;
pub mod pipeline;
pub mod relevance;
pub mod sources;

pub use models::Candidate;
pub use pipeline::{
    Admission, FetchScope, IngestionProgress, Orchestrator, PipelineSettings, PlannedSource, RunOutcome,
    RunSummary, SourceReport, SourceStatus,
};
pub use relevance::{RelevanceFilter, Verdict};
pub use sources::{build_fetcher, CandidateStream, FetchError, SourceFetcher};
