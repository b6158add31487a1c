//! Shared fixtures for pipeline tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use papertrail_config::keywords::{default_institutional_sources, default_keywords};
use papertrail_config::{ScrapeLayout, SourceKind, SourceSpec};
use papertrail_ingestion::{
    Candidate, CandidateStream, FetchError, Orchestrator, PipelineSettings, PlannedSource,
    RelevanceFilter, SourceFetcher,
};
use std::time::Duration;

/// One scripted step of a stub source.
#[derive(Clone)]
pub enum Step {
    Item(Candidate),
    Malformed(&'static str),
    /// Transport failure; the stream ends here.
    Fail(u16),
    /// Never yields again.
    Stall,
}

pub struct StubFetcher {
    steps: Vec<Step>,
}

impl StubFetcher {
    pub fn new(steps: Vec<Step>) -> Box<dyn SourceFetcher> {
        Box::new(Self { steps })
    }
}

impl SourceFetcher for StubFetcher {
    fn produce(&self) -> CandidateStream<'_> {
        stream::iter(self.steps.clone())
            .then(|step| async move {
                match step {
                    Step::Item(c) => Ok(c),
                    Step::Malformed(why) => Err(FetchError::Malformed(why.to_string())),
                    Step::Fail(status) => {
                        Err(FetchError::Status { status, url: "https://stub.example/".to_string() })
                    }
                    Step::Stall => {
                        futures::future::pending::<()>().await;
                        Err(FetchError::Timeout(0))
                    }
                }
            })
            .boxed()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn item(url: &str, title: &str, published: Option<NaiveDate>) -> Step {
    Step::Item(Candidate::new(url, title).with_date(published))
}

pub fn feed_spec(name: &str) -> SourceSpec {
    SourceSpec {
        name: name.to_string(),
        kind: SourceKind::Feed { url: format!("https://{}.example.org/rss", name.to_lowercase()) },
        category: "economics".to_string(),
        institutional: false,
        accept_invalid_certs: false,
    }
}

pub fn scrape_spec(name: &str, layout: ScrapeLayout) -> SourceSpec {
    SourceSpec {
        name: name.to_string(),
        kind: SourceKind::Scrape { layout, url: None, series: None },
        category: layout.default_category().to_string(),
        institutional: false,
        accept_invalid_certs: false,
    }
}

pub fn ready(spec: SourceSpec, steps: Vec<Step>) -> PlannedSource {
    PlannedSource::Ready { spec, fetcher: StubFetcher::new(steps) }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        cutoff: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        concurrency: 4,
        source_timeout: Duration::from_secs(5),
    }
}

pub fn orchestrator(plan: Vec<PlannedSource>) -> Orchestrator {
    orchestrator_with(plan, settings())
}

pub fn orchestrator_with(plan: Vec<PlannedSource>, settings: PipelineSettings) -> Orchestrator {
    let filter = RelevanceFilter::new(default_keywords(), default_institutional_sources()).unwrap();
    Orchestrator::new(plan, filter, settings)
}
