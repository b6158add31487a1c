//! Keyword relevance gate.
//!
//! A paper from a regular source is kept only when its title or abstract
//! mentions one of the configured keywords (case-insensitive, whole
//! words). Papers from institutional sources are always kept.

use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

use crate::models::Candidate;

/// Outcome of the relevance check for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The source is exempt from keyword filtering.
    Institutional,
    /// The candidate mentions this configured keyword.
    Matched(String),
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Verdict::Rejected)
    }
}

/// Escaped term with a word boundary on each side that starts or ends
/// with a word character, so "Rs." and "C++" still match.
fn bounded(term: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if term.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let trail = if term.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    format!("{}{}{}", lead, regex::escape(term), trail)
}

/// Immutable keyword set plus the names of institutional sources.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    pattern: Option<Regex>,
    canonical: HashMap<String, String>,
    institutional: HashSet<String>,
}

impl RelevanceFilter {
    pub fn new<K, I>(keywords: K, institutional: I) -> Result<Self, regex::Error>
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut terms: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();

        let pattern = if terms.is_empty() {
            None
        } else {
            let alternation = terms.iter().map(|t| bounded(t)).collect::<Vec<_>>().join("|");
            Some(
                RegexBuilder::new(&format!("(?:{})", alternation))
                    .case_insensitive(true)
                    .size_limit(1 << 24)
                    .build()?,
            )
        };

        let canonical = terms.into_iter().map(|t| (t.to_lowercase(), t)).collect();

        Ok(Self {
            pattern,
            canonical,
            institutional: institutional.into_iter().map(Into::into).collect(),
        })
    }

    /// Whether `source_name` is in the institutional set.
    pub fn is_institutional(&self, source_name: &str) -> bool {
        self.institutional.contains(source_name)
    }

    /// First configured keyword found in `text`, if any.
    pub fn find_keyword(&self, text: &str) -> Option<String> {
        let m = self.pattern.as_ref()?.find(text)?;
        let found = m.as_str();
        Some(
            self.canonical
                .get(&found.to_lowercase())
                .cloned()
                .unwrap_or_else(|| found.to_string()),
        )
    }

    /// Check title, then abstract. An empty abstract still allows a
    /// title-only match.
    pub fn evaluate(&self, candidate: &Candidate, source_name: &str, institutional: bool) -> Verdict {
        if institutional || self.is_institutional(source_name) {
            return Verdict::Institutional;
        }
        let hit = self
            .find_keyword(&candidate.title)
            .or_else(|| candidate.abstract_text.as_deref().and_then(|a| self.find_keyword(a)));
        match hit {
            Some(keyword) => Verdict::Matched(keyword),
            None => Verdict::Rejected,
        }
    }

    pub fn accept(&self, candidate: &Candidate, source_name: &str, institutional: bool) -> bool {
        self.evaluate(candidate, source_name, institutional).is_accepted()
    }
}
