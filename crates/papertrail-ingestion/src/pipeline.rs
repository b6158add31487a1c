//! Ingestion run orchestration.
//!
//! A run has two phases:
//!   1. Fetch: enabled sources are driven through a bounded pool, in
//!      configuration order. Each candidate is normalised, checked
//!      against the cutoff and the relevance filter, and kept in a
//!      per-source buffer. A source that fails or times out loses its
//!      buffer.
//!   2. Merge: buffers are upserted source by source from this task, so
//!      the store sees a single writer and the last write for an
//!      identity wins.
//!
//! Only a storage failure aborts the run; everything else is recorded in
//! the [`RunSummary`].

use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use papertrail_common::{HttpClient, PapertrailError};
use papertrail_config::{Config, SourceKind, SourceSpec};
use papertrail_db::{DbError, Paper, PaperStore, UpsertOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::Candidate;
use crate::normalise::{canonical_identity, clean_text};
use crate::relevance::{RelevanceFilter, Verdict};
use crate::sources::{build_fetcher, endpoints_for, FetchError, SourceFetcher};

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Candidates published before this date are dropped.
    pub cutoff: NaiveDate,
    /// Sources fetched at the same time.
    pub concurrency: usize,
    /// Deadline for draining one source, all pages included.
    pub source_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cutoff: config.cutoff_date,
            concurrency: config.http.concurrency.max(1),
            source_timeout: Duration::from_secs(config.http.source_timeout_secs),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ── Plan ──────────────────────────────────────────────────────────────────────

/// One configured source, resolved before the run starts.
pub enum PlannedSource {
    Ready { spec: SourceSpec, fetcher: Box<dyn SourceFetcher> },
    Disabled { name: String },
    Misconfigured { name: String, reason: String },
}

impl PlannedSource {
    pub fn name(&self) -> &str {
        match self {
            PlannedSource::Ready { spec, .. } => &spec.name,
            PlannedSource::Disabled { name } | PlannedSource::Misconfigured { name, .. } => name,
        }
    }
}

/// Which fetch kinds a run drives. Sources outside the scope are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchScope {
    #[default]
    All,
    FeedsOnly,
    ScrapesOnly,
    ListingsOnly,
}

impl FetchScope {
    pub fn includes(&self, kind: &SourceKind) -> bool {
        match self {
            FetchScope::All => true,
            FetchScope::FeedsOnly => matches!(kind, SourceKind::Feed { .. }),
            FetchScope::ScrapesOnly => matches!(kind, SourceKind::Scrape { .. }),
            FetchScope::ListingsOnly => matches!(kind, SourceKind::Listing { .. }),
        }
    }
}

impl fmt::Display for FetchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchScope::All => "all",
            FetchScope::FeedsOnly => "feeds-only",
            FetchScope::ScrapesOnly => "scrapes-only",
            FetchScope::ListingsOnly => "listings-only",
        })
    }
}

// ── Progress events ───────────────────────────────────────────────────────────

/// Progress event emitted during a run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct IngestionProgress {
    pub run_id: Uuid,
    pub source: Option<String>,
    pub stage: String,
    pub message: String,
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed(String),
    Skipped(String),
    Misconfigured(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub kind: Option<String>,
    pub status: SourceStatus,
    pub fetched: usize,
    pub accepted: usize,
    pub rejected_cutoff: usize,
    pub rejected_irrelevant: usize,
    pub errored: usize,
    pub inserted: usize,
    pub updated: usize,
}

impl SourceReport {
    fn new(name: &str, kind: Option<&str>, status: SourceStatus) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.map(str::to_string),
            status,
            fetched: 0,
            accepted: 0,
            rejected_cutoff: 0,
            rejected_irrelevant: 0,
            errored: 0,
            inserted: 0,
            updated: 0,
        }
    }

    /// Candidates dropped by the cutoff or the relevance filter.
    pub fn rejected(&self) -> usize {
        self.rejected_cutoff + self.rejected_irrelevant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    PartialFailure,
    /// No source completed, including the case of no enabled source.
    NothingReachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub sources: Vec<SourceReport>,
    /// Papers in the store after the merge.
    pub store_total: u64,
}

impl RunSummary {
    pub fn outcome(&self) -> RunOutcome {
        let succeeded = self.sources.iter().filter(|s| s.status == SourceStatus::Succeeded).count();
        let broken = self
            .sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Failed(_) | SourceStatus::Misconfigured(_)))
            .count();
        if succeeded == 0 {
            RunOutcome::NothingReachable
        } else if broken > 0 {
            RunOutcome::PartialFailure
        } else {
            RunOutcome::Success
        }
    }

    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn total_inserted(&self) -> usize {
        self.sources.iter().map(|s| s.inserted).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.sources.iter().map(|s| s.updated).sum()
    }
}

// ── Admission ─────────────────────────────────────────────────────────────────

/// What happens to one candidate.
#[derive(Debug, PartialEq)]
pub enum Admission {
    Accepted(Box<Paper>),
    TooOld,
    Irrelevant,
    Malformed(String),
}

struct Collected {
    report: SourceReport,
    papers: Vec<Paper>,
}

impl Collected {
    fn empty(report: SourceReport) -> Self {
        Self { report, papers: Vec::new() }
    }
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

pub struct Orchestrator {
    plan: Vec<PlannedSource>,
    filter: RelevanceFilter,
    settings: PipelineSettings,
    scope: FetchScope,
    progress_tx: Option<broadcast::Sender<IngestionProgress>>,
}

impl Orchestrator {
    pub fn new(plan: Vec<PlannedSource>, filter: RelevanceFilter, settings: PipelineSettings) -> Self {
        Self { plan, filter, settings, scope: FetchScope::All, progress_tx: None }
    }

    pub fn with_scope(mut self, scope: FetchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_progress(mut self, tx: broadcast::Sender<IngestionProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn plan(&self) -> &[PlannedSource] {
        &self.plan
    }

    /// Build the plan from configuration: validate each source on its own,
    /// allow every valid endpoint on the HTTP client, and build fetchers.
    pub fn from_config(config: &Config) -> Result<Self, PapertrailError> {
        let settings = PipelineSettings::from_config(config);
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let user_agent = config.http.user_agent.as_str();

        let filter = RelevanceFilter::new(&config.relevance.keywords, config.institutional_names())
            .map_err(|e| PapertrailError::Config(format!("invalid keyword set: {}", e)))?;

        let validated: Vec<_> = config
            .sources
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.display_name(i), entry.is_enabled(), entry.validate(i)))
            .collect();

        let mut shared = HttpClient::new(timeout, user_agent)?;
        for (_, enabled, result) in &validated {
            if let (true, Ok(spec)) = (*enabled, result) {
                if !spec.accept_invalid_certs {
                    for url in endpoints_for(spec) {
                        shared.allow_url(&url);
                    }
                }
            }
        }

        let mut plan = Vec::with_capacity(validated.len());
        for (name, enabled, result) in validated {
            if !enabled {
                plan.push(PlannedSource::Disabled { name });
                continue;
            }
            match result {
                Err(e) => {
                    warn!(source = %name, error = %e, "Source misconfigured");
                    plan.push(PlannedSource::Misconfigured { name, reason: e.to_string() });
                }
                Ok(spec) => {
                    let client = if spec.accept_invalid_certs {
                        let mut insecure = HttpClient::insecure(timeout, user_agent)?;
                        for url in endpoints_for(&spec) {
                            insecure.allow_url(&url);
                        }
                        insecure
                    } else {
                        shared.clone()
                    };
                    let fetcher = build_fetcher(&spec, client, settings.cutoff);
                    plan.push(PlannedSource::Ready { spec, fetcher });
                }
            }
        }

        Ok(Self::new(plan, filter, settings))
    }

    fn emit(&self, run_id: Uuid, source: Option<&str>, stage: &str, message: String) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(IngestionProgress {
                run_id,
                source: source.map(str::to_string),
                stage: stage.to_string(),
                message,
            });
        }
    }

    /// Run every planned source and merge the results into `store`.
    #[instrument(skip_all, fields(scope = %self.scope))]
    pub async fn run(&self, store: &dyn PaperStore) -> Result<RunSummary, DbError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let t0 = Instant::now();
        info!(run_id = %run_id, sources = self.plan.len(), "Starting ingestion run");
        self.emit(run_id, None, "start", format!("{} configured sources", self.plan.len()));

        let collected: Vec<Collected> = stream::iter(self.plan.iter())
            .map(|planned| self.collect(run_id, planned, started_at))
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        self.emit(run_id, None, "merge", "merging accepted papers".to_string());
        let mut sources = Vec::with_capacity(collected.len());
        for Collected { mut report, papers } in collected {
            for paper in &papers {
                match store.upsert(paper).await? {
                    UpsertOutcome::Inserted => report.inserted += 1,
                    UpsertOutcome::Updated => report.updated += 1,
                }
            }
            if !papers.is_empty() {
                debug!(source = %report.name, inserted = report.inserted, updated = report.updated, "Source merged");
            }
            sources.push(report);
        }

        let summary = RunSummary {
            run_id,
            started_at,
            duration_ms: t0.elapsed().as_millis() as u64,
            sources,
            store_total: store.count().await?,
        };

        info!(
            run_id = %run_id,
            outcome = ?summary.outcome(),
            inserted = summary.total_inserted(),
            updated = summary.total_updated(),
            store_total = summary.store_total,
            duration_ms = summary.duration_ms,
            "Ingestion run finished"
        );
        self.emit(run_id, None, "done", format!("{:?}", summary.outcome()));
        Ok(summary)
    }

    async fn collect(&self, run_id: Uuid, planned: &PlannedSource, seen_at: DateTime<Utc>) -> Collected {
        match planned {
            PlannedSource::Disabled { name } => {
                debug!(source = %name, "Source disabled");
                Collected::empty(SourceReport::new(name, None, SourceStatus::Skipped("disabled".to_string())))
            }
            PlannedSource::Misconfigured { name, reason } => {
                Collected::empty(SourceReport::new(name, None, SourceStatus::Misconfigured(reason.clone())))
            }
            PlannedSource::Ready { spec, .. } if !self.scope.includes(&spec.kind) => {
                debug!(source = %spec.name, scope = %self.scope, "Source outside scope");
                Collected::empty(SourceReport::new(
                    &spec.name,
                    Some(spec.kind.as_str()),
                    SourceStatus::Skipped(format!("outside {} scope", self.scope)),
                ))
            }
            PlannedSource::Ready { spec, fetcher } => self.drain(run_id, spec, fetcher.as_ref(), seen_at).await,
        }
    }

    #[instrument(skip_all, fields(source = %spec.name, kind = spec.kind.as_str()))]
    async fn drain(
        &self,
        run_id: Uuid,
        spec: &SourceSpec,
        fetcher: &dyn SourceFetcher,
        seen_at: DateTime<Utc>,
    ) -> Collected {
        self.emit(run_id, Some(&spec.name), "fetch", "fetching".to_string());

        let mut report = SourceReport::new(&spec.name, Some(spec.kind.as_str()), SourceStatus::Succeeded);
        let mut papers = Vec::new();

        let result = tokio::time::timeout(
            self.settings.source_timeout,
            self.consume(spec, fetcher, seen_at, &mut report, &mut papers),
        )
        .await;

        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(FetchError::Timeout(self.settings.source_timeout.as_secs())),
        };

        match failure {
            Some(e) => {
                warn!(error = %e, discarded = papers.len(), "Source failed, its records are discarded");
                papers.clear();
                report.status = SourceStatus::Failed(e.to_string());
                self.emit(run_id, Some(&spec.name), "failed", e.to_string());
            }
            None => {
                info!(
                    fetched = report.fetched,
                    accepted = report.accepted,
                    rejected = report.rejected(),
                    errored = report.errored,
                    "Source fetched"
                );
                self.emit(
                    run_id,
                    Some(&spec.name),
                    "fetched",
                    format!("{} fetched, {} accepted", report.fetched, report.accepted),
                );
            }
        }

        Collected { report, papers }
    }

    async fn consume(
        &self,
        spec: &SourceSpec,
        fetcher: &dyn SourceFetcher,
        seen_at: DateTime<Utc>,
        report: &mut SourceReport,
        papers: &mut Vec<Paper>,
    ) -> Result<(), FetchError> {
        let mut candidates = fetcher.produce();
        while let Some(item) = candidates.next().await {
            let candidate = match item {
                Ok(candidate) => candidate,
                Err(e) if e.is_item_level() => {
                    report.fetched += 1;
                    report.errored += 1;
                    warn!(error = %e, "Skipping malformed record");
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.fetched += 1;

            match self.admit(candidate, spec, seen_at) {
                Admission::Accepted(paper) => {
                    report.accepted += 1;
                    papers.push(*paper);
                }
                Admission::TooOld => report.rejected_cutoff += 1,
                Admission::Irrelevant => report.rejected_irrelevant += 1,
                Admission::Malformed(reason) => {
                    report.errored += 1;
                    warn!(%reason, "Skipping malformed record");
                }
            }
        }
        Ok(())
    }

    /// Normalise one candidate and decide whether it is stored.
    pub fn admit(&self, candidate: Candidate, spec: &SourceSpec, seen_at: DateTime<Utc>) -> Admission {
        let identity = match canonical_identity(&candidate.url) {
            Ok(identity) => identity,
            Err(e) => return Admission::Malformed(e.to_string()),
        };
        let title = clean_text(&candidate.title);
        if title.is_empty() {
            return Admission::Malformed(format!("{} has an empty title", identity));
        }

        if let Some(date) = candidate.publication_date {
            if date < self.settings.cutoff {
                debug!(%identity, %date, "Before cutoff");
                return Admission::TooOld;
            }
        }

        let matched_keyword = match self.filter.evaluate(&candidate, &spec.name, spec.institutional) {
            Verdict::Rejected => {
                debug!(%identity, "No relevance keyword");
                return Admission::Irrelevant;
            }
            Verdict::Matched(keyword) => Some(keyword),
            Verdict::Institutional => self.filter.find_keyword(&title),
        };

        Admission::Accepted(Box::new(Paper {
            identity,
            url: candidate.url,
            title,
            authors: candidate.authors,
            abstract_text: candidate.abstract_text,
            publication_date: candidate.publication_date,
            source_name: spec.name.clone(),
            category: spec.category.clone(),
            is_institutional_override: spec.institutional || self.filter.is_institutional(&spec.name),
            matched_keyword,
            first_seen_at: seen_at,
            last_seen_at: seen_at,
        }))
    }
}
