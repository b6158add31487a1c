//! In-process paper store for tests and dry runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::schema::{display_order, Paper, PaperQuery};
use crate::store::{PaperStore, UpsertOutcome};

/// Map keyed by identity. The write lock makes each upsert atomic.
#[derive(Default)]
pub struct MemoryPaperStore {
    papers: RwLock<BTreeMap<String, Paper>>,
}

impl MemoryPaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored paper in identity order.
    pub async fn snapshot(&self) -> Vec<Paper> {
        self.papers.read().await.values().cloned().collect()
    }

    async fn distinct(&self, field: fn(&Paper) -> &str) -> Vec<String> {
        let mut values: Vec<String> = self.papers.read().await.values().map(|p| field(p).to_string()).collect();
        values.sort();
        values.dedup();
        values
    }
}

#[async_trait]
impl PaperStore for MemoryPaperStore {
    async fn exists(&self, identity: &str) -> Result<bool> {
        Ok(self.papers.read().await.contains_key(identity))
    }

    async fn upsert(&self, paper: &Paper) -> Result<UpsertOutcome> {
        let mut papers = self.papers.write().await;
        match papers.get_mut(&paper.identity) {
            Some(existing) => {
                let first_seen_at = existing.first_seen_at;
                *existing = paper.clone();
                existing.first_seen_at = first_seen_at;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                papers.insert(paper.identity.clone(), paper.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, identity: &str) -> Result<Option<Paper>> {
        Ok(self.papers.read().await.get(identity).cloned())
    }

    async fn query(&self, query: &PaperQuery) -> Result<Vec<Paper>> {
        let mut matched: Vec<Paper> = self
            .papers
            .read()
            .await
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matched.sort_by(display_order);
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.papers.read().await.len() as u64)
    }

    async fn sources(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|p| p.source_name.as_str()).await)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|p| p.category.as_str()).await)
    }
}
