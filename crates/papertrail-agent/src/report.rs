//! Human-readable run report.

use papertrail_ingestion::{RunOutcome, RunSummary, SourceReport, SourceStatus};
use std::fmt::Write;

const NAME_WIDTH: usize = 28;

fn status_label(status: &SourceStatus) -> &'static str {
    match status {
        SourceStatus::Succeeded => "ok",
        SourceStatus::Failed(_) => "failed",
        SourceStatus::Skipped(_) => "skipped",
        SourceStatus::Misconfigured(_) => "config",
    }
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Success => "success",
        RunOutcome::PartialFailure => "partial failure",
        RunOutcome::NothingReachable => "nothing reachable",
    }
}

fn truncate(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(NAME_WIDTH - 1).collect();
        short.push('~');
        short
    }
}

fn row(out: &mut String, name: &str, kind: &str, status: &str, r: &SourceReport) {
    let _ = writeln!(
        out,
        "{:<w$}  {:<7}  {:<7}  {:>7}  {:>8}  {:>8}  {:>7}  {:>8}  {:>7}",
        truncate(name),
        kind,
        status,
        r.fetched,
        r.accepted,
        r.rejected(),
        r.errored,
        r.inserted,
        r.updated,
        w = NAME_WIDTH,
    );
}

/// Per-source table, totals, then the reason for every source that did
/// not succeed.
pub fn render(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<w$}  {:<7}  {:<7}  {:>7}  {:>8}  {:>8}  {:>7}  {:>8}  {:>7}",
        "SOURCE", "KIND", "STATUS", "FETCHED", "ACCEPTED", "REJECTED", "ERRORED", "INSERTED", "UPDATED",
        w = NAME_WIDTH,
    );

    let mut totals = SourceReport {
        name: "TOTAL".to_string(),
        kind: None,
        status: SourceStatus::Succeeded,
        fetched: 0,
        accepted: 0,
        rejected_cutoff: 0,
        rejected_irrelevant: 0,
        errored: 0,
        inserted: 0,
        updated: 0,
    };
    for r in &summary.sources {
        row(&mut out, &r.name, r.kind.as_deref().unwrap_or("-"), status_label(&r.status), r);
        totals.fetched += r.fetched;
        totals.accepted += r.accepted;
        totals.rejected_cutoff += r.rejected_cutoff;
        totals.rejected_irrelevant += r.rejected_irrelevant;
        totals.errored += r.errored;
        totals.inserted += r.inserted;
        totals.updated += r.updated;
    }
    row(&mut out, "TOTAL", "", "", &totals);

    let notes: Vec<_> = summary
        .sources
        .iter()
        .filter_map(|r| match &r.status {
            SourceStatus::Failed(reason)
            | SourceStatus::Skipped(reason)
            | SourceStatus::Misconfigured(reason) => Some((r.name.as_str(), reason.as_str())),
            SourceStatus::Succeeded => None,
        })
        .collect();
    if !notes.is_empty() {
        out.push('\n');
        for (name, reason) in notes {
            let _ = writeln!(out, "  {}: {}", name, reason);
        }
    }

    let _ = writeln!(
        out,
        "\n{} | {} papers stored | {} ms | run {}",
        outcome_label(summary.outcome()),
        summary.store_total,
        summary.duration_ms,
        summary.run_id,
    );
    out
}
