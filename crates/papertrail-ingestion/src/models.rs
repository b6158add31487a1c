//! Data models for the ingestion pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record as produced by a fetcher, before identity normalisation,
/// cutoff and relevance checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Absolute locator as published by the source.
    pub url: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: Option<String>,
    pub publication_date: Option<NaiveDate>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: None,
            publication_date: None,
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_abstract(mut self, abstract_text: Option<String>) -> Self {
        self.abstract_text = abstract_text;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.publication_date = date;
        self
    }
}
