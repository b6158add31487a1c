//! End-to-end runs through the orchestrator with scripted sources.

mod common;

use common::*;
use papertrail_config::ScrapeLayout;
use papertrail_db::{Database, MemoryPaperStore, PaperQuery, PaperRepository, PaperStore};
use papertrail_ingestion::{
    FetchScope, PipelineSettings, PlannedSource, RunOutcome, SourceStatus,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn counts(summary: &papertrail_ingestion::RunSummary, name: &str) -> (usize, usize, usize) {
    let r = summary.source(name).unwrap();
    (r.fetched, r.accepted, r.rejected())
}

#[tokio::test]
async fn test_mixed_run_reports_per_source() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(
            feed_spec("JournalX"),
            vec![item("https://journalx.example.org/a/1", "Indian rupee volatility", date(2023, 11, 5))],
        ),
        ready(
            scrape_spec("RBI", ScrapeLayout::Rbi),
            vec![item(
                "https://rbi.org.in/Scripts/PublicationsView.aspx?id=23001",
                "Monetary Policy Report - March 2024",
                date(2024, 3, 1),
            )],
        ),
        PlannedSource::Disabled { name: "JournalY".to_string() },
    ];

    let summary = orchestrator(plan).run(&store).await.unwrap();

    assert_eq!(counts(&summary, "JournalX"), (1, 0, 1));
    assert_eq!(summary.source("JournalX").unwrap().rejected_cutoff, 1);
    assert_eq!(counts(&summary, "RBI"), (1, 1, 0));
    assert_eq!(counts(&summary, "JournalY"), (0, 0, 0));
    assert_eq!(
        summary.source("JournalY").unwrap().status,
        SourceStatus::Skipped("disabled".to_string())
    );
    assert_eq!(summary.store_total, 1);
    assert_eq!(summary.outcome(), RunOutcome::Success);

    let stored = store
        .get("https://rbi.org.in/Scripts/PublicationsView.aspx?id=23001")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_institutional_override);
    assert_eq!(stored.source_name, "RBI");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = MemoryPaperStore::new();
    let o = orchestrator(vec![ready(
        feed_spec("JournalX"),
        vec![
            item("https://journalx.example.org/a/1", "GST and state revenues", date(2024, 2, 1)),
            item("https://journalx.example.org/a/2", "Credit in Maharashtra", None),
        ],
    )]);

    let first = o.run(&store).await.unwrap();
    assert_eq!(first.total_inserted(), 2);
    let before = store.get("https://journalx.example.org/a/1").await.unwrap().unwrap();

    let second = o.run(&store).await.unwrap();
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_updated(), 2);
    assert_eq!(second.store_total, 2);

    let after = store.get("https://journalx.example.org/a/1").await.unwrap().unwrap();
    assert_eq!(after.first_seen_at, before.first_seen_at);
    assert!(after.last_seen_at >= before.last_seen_at);
}

#[tokio::test]
async fn test_failed_source_keeps_nothing_and_others_proceed() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(
            feed_spec("Flaky"),
            vec![
                item("https://flaky.example.org/a/1", "India trade", date(2024, 5, 1)),
                item("https://flaky.example.org/a/2", "India exports", date(2024, 5, 2)),
                Step::Fail(503),
            ],
        ),
        ready(
            feed_spec("Steady"),
            vec![item("https://steady.example.org/a/1", "Kerala migration", date(2024, 5, 1))],
        ),
    ];

    let summary = orchestrator(plan).run(&store).await.unwrap();

    let flaky = summary.source("Flaky").unwrap();
    assert!(matches!(flaky.status, SourceStatus::Failed(ref reason) if reason.contains("503")));
    assert_eq!(flaky.inserted, 0);
    assert_eq!(summary.source("Steady").unwrap().inserted, 1);
    assert_eq!(summary.store_total, 1);
    assert!(!store.exists("https://flaky.example.org/a/1").await.unwrap());
    assert_eq!(summary.outcome(), RunOutcome::PartialFailure);
}

#[tokio::test]
async fn test_stalled_source_times_out() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(
            feed_spec("Slow"),
            vec![item("https://slow.example.org/a/1", "India", None), Step::Stall],
        ),
        ready(feed_spec("Fast"), vec![item("https://fast.example.org/a/1", "Delhi air", None)]),
    ];
    let settings = PipelineSettings { source_timeout: Duration::from_millis(100), ..settings() };

    let summary = orchestrator_with(plan, settings).run(&store).await.unwrap();

    assert!(matches!(summary.source("Slow").unwrap().status, SourceStatus::Failed(_)));
    assert_eq!(summary.source("Fast").unwrap().status, SourceStatus::Succeeded);
    assert_eq!(summary.store_total, 1);
}

#[tokio::test]
async fn test_all_sources_failing_is_nothing_reachable() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(feed_spec("A"), vec![Step::Fail(500)]),
        PlannedSource::Misconfigured { name: "B".to_string(), reason: "missing url".to_string() },
    ];
    let summary = orchestrator(plan).run(&store).await.unwrap();
    assert_eq!(summary.outcome(), RunOutcome::NothingReachable);
    assert_eq!(
        summary.source("B").unwrap().status,
        SourceStatus::Misconfigured("missing url".to_string())
    );
    assert_eq!(summary.store_total, 0);
}

#[tokio::test]
async fn test_malformed_records_are_skipped() {
    let store = MemoryPaperStore::new();
    let plan = vec![ready(
        feed_spec("JournalX"),
        vec![
            Step::Malformed("no link"),
            item("https://journalx.example.org/a/1", "   ", None),
            item("https://journalx.example.org/a/2", "Bihar floods", None),
        ],
    )];

    let summary = orchestrator(plan).run(&store).await.unwrap();
    let report = summary.source("JournalX").unwrap();
    assert_eq!(report.status, SourceStatus::Succeeded);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.errored, 2);
    assert_eq!(report.accepted, 1);
}

#[tokio::test]
async fn test_same_identity_across_sources_last_write_wins() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(
            feed_spec("SSRN"),
            vec![item("https://doi.example.org/10.1/xyz?utm_source=ssrn", "India's fiscal rules", None)],
        ),
        ready(
            feed_spec("RePEc"),
            vec![item("https://doi.example.org/10.1/xyz/", "India's fiscal rules (revised)", None)],
        ),
    ];

    let summary = orchestrator(plan).run(&store).await.unwrap();

    assert_eq!(summary.store_total, 1);
    assert_eq!(summary.source("SSRN").unwrap().inserted, 1);
    assert_eq!(summary.source("RePEc").unwrap().updated, 1);
    let paper = store.get("https://doi.example.org/10.1/xyz").await.unwrap().unwrap();
    assert_eq!(paper.source_name, "RePEc");
    assert_eq!(paper.title, "India's fiscal rules (revised)");
}

#[tokio::test]
async fn test_reports_follow_configuration_order() {
    let names = ["E", "D", "C", "B", "A"];
    for concurrency in [1, 4] {
        let store = MemoryPaperStore::new();
        let plan = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                ready(
                    feed_spec(name),
                    vec![item(&format!("https://{}.example.org/p/{}", name.to_lowercase(), i), "Indian banks", None)],
                )
            })
            .collect();
        let settings = PipelineSettings { concurrency, ..settings() };

        let summary = orchestrator_with(plan, settings).run(&store).await.unwrap();

        let order: Vec<_> = summary.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, names.to_vec());
        assert_eq!(summary.store_total, 5);
    }
}

#[tokio::test]
async fn test_scope_skips_other_kinds() {
    let store = MemoryPaperStore::new();
    let plan = vec![
        ready(feed_spec("JournalX"), vec![item("https://journalx.example.org/a/1", "India", None)]),
        ready(
            scrape_spec("NIPFP", ScrapeLayout::Nipfp),
            vec![item("https://nipfp.org.in/publications/1", "Fiscal federalism", None)],
        ),
    ];

    let summary = orchestrator(plan).with_scope(FetchScope::ScrapesOnly).run(&store).await.unwrap();

    assert!(matches!(summary.source("JournalX").unwrap().status, SourceStatus::Skipped(_)));
    assert_eq!(summary.source("NIPFP").unwrap().inserted, 1);
    assert_eq!(summary.store_total, 1);
}

#[tokio::test]
async fn test_progress_events_are_broadcast() {
    let store = MemoryPaperStore::new();
    let (tx, mut rx) = broadcast::channel(64);
    let plan = vec![ready(feed_spec("JournalX"), vec![item("https://journalx.example.org/a/1", "India", None)])];

    let summary = orchestrator(plan).with_progress(tx).run(&store).await.unwrap();

    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.run_id, summary.run_id);
        stages.push(event.stage);
    }
    assert_eq!(stages, vec!["start", "fetch", "fetched", "merge", "done"]);
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papers.db");
    let plan = || {
        vec![ready(
            feed_spec("JournalX"),
            vec![
                item("https://journalx.example.org/a/1", "Aadhaar and welfare", date(2024, 8, 1)),
                item("https://journalx.example.org/a/2", "Tamil Nadu schooling", date(2024, 9, 1)),
            ],
        )]
    };

    {
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        let repo = PaperRepository::new(Arc::new(db));
        let summary = orchestrator(plan()).run(&repo).await.unwrap();
        assert_eq!(summary.total_inserted(), 2);
    }

    let db = Database::open(&path).unwrap();
    db.initialize().unwrap();
    let repo = PaperRepository::new(Arc::new(db));
    let summary = orchestrator(plan()).run(&repo).await.unwrap();
    assert_eq!(summary.total_inserted(), 0);
    assert_eq!(summary.total_updated(), 2);

    let papers = repo.query(&PaperQuery::default()).await.unwrap();
    let titles: Vec<_> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Tamil Nadu schooling", "Aadhaar and welfare"]);
}
