//! Paper record and read-query definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const TABLE_PAPERS: &str = "papers";

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS papers (
    identity TEXT PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    authors TEXT NOT NULL DEFAULT '[]',
    abstract TEXT,
    publication_date TEXT,
    source_name TEXT NOT NULL,
    category TEXT NOT NULL,
    is_institutional_override INTEGER NOT NULL DEFAULT 0,
    matched_keyword TEXT,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_papers_source ON papers(source_name);
CREATE INDEX IF NOT EXISTS idx_papers_category ON papers(category);
CREATE INDEX IF NOT EXISTS idx_papers_date ON papers(publication_date DESC);
"#;

/// A normalised paper as persisted.
///
/// `identity` is the canonical locator and the primary key. On re-ingest
/// every field is refreshed except `first_seen_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub identity: String,
    /// Locator as published by the source, before canonicalisation.
    pub url: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub source_name: String,
    pub category: String,
    pub is_institutional_override: bool,
    /// Keyword that let the paper through the relevance filter, if any.
    pub matched_keyword: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Read filters for the renderer. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperQuery {
    pub source: Option<String>,
    pub category: Option<String>,
    /// Keep papers published on or after this date. Undated papers are kept.
    pub since: Option<NaiveDate>,
    pub institutional_only: bool,
    pub limit: Option<usize>,
}

impl Default for PaperQuery {
    fn default() -> Self {
        Self {
            source: None,
            category: None,
            since: None,
            institutional_only: false,
            limit: Some(500),
        }
    }
}

impl PaperQuery {
    pub fn unlimited() -> Self {
        Self { limit: None, ..Self::default() }
    }

    pub fn matches(&self, paper: &Paper) -> bool {
        if let Some(source) = &self.source {
            if &paper.source_name != source { return false; }
        }
        if let Some(category) = &self.category {
            if &paper.category != category { return false; }
        }
        if let (Some(since), Some(date)) = (self.since, paper.publication_date) {
            if date < since { return false; }
        }
        if self.institutional_only && !paper.is_institutional_override {
            return false;
        }
        true
    }
}

/// Newest publication first, undated papers last, then most recently
/// discovered first. Identity breaks remaining ties.
pub fn display_order(a: &Paper, b: &Paper) -> Ordering {
    match (a.publication_date, b.publication_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.first_seen_at.cmp(&a.first_seen_at))
    .then_with(|| a.identity.cmp(&b.identity))
}

#[cfg(test)]
pub(crate) fn sample_paper(identity: &str, date: Option<&str>) -> Paper {
    let now = Utc::now();
    Paper {
        identity: identity.to_string(),
        url: identity.to_string(),
        title: format!("Paper at {}", identity),
        authors: vec!["A. Author".to_string(), "B. Author".to_string()],
        abstract_text: Some("Abstract".to_string()),
        publication_date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        source_name: "NBER".to_string(),
        category: "economics".to_string(),
        is_institutional_override: false,
        matched_keyword: Some("India".to_string()),
        first_seen_at: now,
        last_seen_at: now,
    }
}
