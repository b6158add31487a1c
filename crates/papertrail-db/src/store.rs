//! The storage contract the ingestion pipeline writes through.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::schema::{Paper, PaperQuery};

/// What an upsert did to the persisted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Idempotent merge target keyed by paper identity.
///
/// Implementations must make `upsert` atomic per identity: repeated or
/// concurrent upserts of one identity leave exactly one row, and the
/// stored `first_seen_at` of an existing row is never overwritten.
#[async_trait]
pub trait PaperStore: Send + Sync {
    async fn exists(&self, identity: &str) -> Result<bool>;

    async fn upsert(&self, paper: &Paper) -> Result<UpsertOutcome>;

    async fn get(&self, identity: &str) -> Result<Option<Paper>>;

    async fn query(&self, query: &PaperQuery) -> Result<Vec<Paper>>;

    async fn count(&self) -> Result<u64>;

    /// Distinct source names, sorted.
    async fn sources(&self) -> Result<Vec<String>>;

    /// Distinct categories, sorted.
    async fn categories(&self) -> Result<Vec<String>>;
}
