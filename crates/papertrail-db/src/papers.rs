//! Paper repository.
//!
//! SQLite-backed [`PaperStore`]. Each call runs on the blocking pool and
//! holds the connection mutex for its whole transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tracing::debug;

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::{Paper, PaperQuery};
use crate::store::{PaperStore, UpsertOutcome};

const DATE_FMT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "identity, url, title, authors, abstract, publication_date, \
     source_name, category, is_institutional_override, matched_keyword, first_seen_at, last_seen_at";

/// Repository for paper operations.
#[derive(Clone)]
pub struct PaperRepository {
    db: Arc<Database>,
}

impl PaperRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock()?;
            f(&mut conn)
        })
        .await?
    }
}

fn upsert_blocking(conn: &mut Connection, paper: &Paper) -> Result<UpsertOutcome> {
    let authors = serde_json::to_string(&paper.authors)?;
    let tx = conn.transaction()?;

    let existed: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM papers WHERE identity = ?1)",
        [&paper.identity],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT INTO papers (
            identity, url, title, authors, abstract, publication_date,
            source_name, category, is_institutional_override, matched_keyword,
            first_seen_at, last_seen_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(identity) DO UPDATE SET
            url = excluded.url,
            title = excluded.title,
            authors = excluded.authors,
            abstract = excluded.abstract,
            publication_date = excluded.publication_date,
            source_name = excluded.source_name,
            category = excluded.category,
            is_institutional_override = excluded.is_institutional_override,
            matched_keyword = excluded.matched_keyword,
            last_seen_at = excluded.last_seen_at",
        params![
            paper.identity,
            paper.url,
            paper.title,
            authors,
            paper.abstract_text,
            paper.publication_date.map(|d| d.format(DATE_FMT).to_string()),
            paper.source_name,
            paper.category,
            paper.is_institutional_override,
            paper.matched_keyword,
            paper.first_seen_at.to_rfc3339(),
            paper.last_seen_at.to_rfc3339(),
        ],
    )?;
    tx.commit()?;

    Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
}

fn row_to_paper(row: &Row<'_>) -> rusqlite::Result<RawPaper> {
    Ok(RawPaper {
        identity: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        authors: row.get(3)?,
        abstract_text: row.get(4)?,
        publication_date: row.get(5)?,
        source_name: row.get(6)?,
        category: row.get(7)?,
        is_institutional_override: row.get(8)?,
        matched_keyword: row.get(9)?,
        first_seen_at: row.get(10)?,
        last_seen_at: row.get(11)?,
    })
}

/// Row as stored, before text columns are decoded.
struct RawPaper {
    identity: String,
    url: String,
    title: String,
    authors: String,
    abstract_text: Option<String>,
    publication_date: Option<String>,
    source_name: String,
    category: String,
    is_institutional_override: bool,
    matched_keyword: Option<String>,
    first_seen_at: String,
    last_seen_at: String,
}

impl RawPaper {
    fn decode(self) -> Result<Paper> {
        let publication_date = match self.publication_date {
            Some(d) => Some(
                NaiveDate::parse_from_str(&d, DATE_FMT)
                    .map_err(|e| DbError::InvalidRecord(format!("{}: bad date '{}': {}", self.identity, d, e)))?,
            ),
            None => None,
        };
        Ok(Paper {
            authors: serde_json::from_str(&self.authors)?,
            publication_date,
            first_seen_at: parse_timestamp(&self.identity, &self.first_seen_at)?,
            last_seen_at: parse_timestamp(&self.identity, &self.last_seen_at)?,
            identity: self.identity,
            url: self.url,
            title: self.title,
            abstract_text: self.abstract_text,
            source_name: self.source_name,
            category: self.category,
            is_institutional_override: self.is_institutional_override,
            matched_keyword: self.matched_keyword,
        })
    }
}

fn parse_timestamp(identity: &str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidRecord(format!("{}: bad timestamp '{}': {}", identity, s, e)))
}

fn query_blocking(conn: &Connection, query: &PaperQuery) -> Result<Vec<Paper>> {
    let mut sql = format!("SELECT {} FROM papers WHERE 1=1", SELECT_COLUMNS);
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(source) = &query.source {
        args.push(Box::new(source.clone()));
        sql.push_str(&format!(" AND source_name = ?{}", args.len()));
    }
    if let Some(category) = &query.category {
        args.push(Box::new(category.clone()));
        sql.push_str(&format!(" AND category = ?{}", args.len()));
    }
    if let Some(since) = query.since {
        args.push(Box::new(since.format(DATE_FMT).to_string()));
        sql.push_str(&format!(" AND (publication_date >= ?{} OR publication_date IS NULL)", args.len()));
    }
    if query.institutional_only {
        sql.push_str(" AND is_institutional_override = 1");
    }

    sql.push_str(" ORDER BY publication_date IS NULL, publication_date DESC, first_seen_at DESC, identity ASC");

    if let Some(limit) = query.limit {
        args.push(Box::new(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", args.len()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let raws = stmt
        .query_map(arg_refs.as_slice(), row_to_paper)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawPaper::decode).collect()
}

fn distinct_blocking(conn: &Connection, column: &str) -> Result<Vec<String>> {
    let sql = format!("SELECT DISTINCT {col} FROM papers WHERE {col} IS NOT NULL ORDER BY {col}", col = column);
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values)
}

#[async_trait]
impl PaperStore for PaperRepository {
    async fn exists(&self, identity: &str) -> Result<bool> {
        let identity = identity.to_string();
        self.with_conn(move |conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM papers WHERE identity = ?1)",
                [&identity],
                |row| row.get(0),
            )?;
            Ok(found)
        })
        .await
    }

    async fn upsert(&self, paper: &Paper) -> Result<UpsertOutcome> {
        let paper = paper.clone();
        let outcome = self.with_conn(move |conn| upsert_blocking(conn, &paper)).await?;
        debug!(?outcome, "Paper upserted");
        Ok(outcome)
    }

    async fn get(&self, identity: &str) -> Result<Option<Paper>> {
        let identity = identity.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM papers WHERE identity = ?1", SELECT_COLUMNS);
            let raw = conn.query_row(&sql, [&identity], row_to_paper).optional()?;
            raw.map(RawPaper::decode).transpose()
        })
        .await
    }

    async fn query(&self, query: &PaperQuery) -> Result<Vec<Paper>> {
        let query = query.clone();
        self.with_conn(move |conn| query_blocking(conn, &query)).await
    }

    async fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }

    async fn sources(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| distinct_blocking(conn, "source_name")).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| distinct_blocking(conn, "category")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sample_paper;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn repo() -> PaperRepository {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        PaperRepository::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_insert_then_update_keeps_first_seen() {
        let repo = repo();
        let first = sample_paper("https://www.nber.org/papers/w1", Some("2024-03-01"));
        assert_eq!(repo.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);
        assert!(repo.exists(&first.identity).await.unwrap());

        let mut again = first.clone();
        again.title = "Corrected title".to_string();
        again.first_seen_at = first.first_seen_at + Duration::days(1);
        again.last_seen_at = first.last_seen_at + Duration::days(1);
        assert_eq!(repo.upsert(&again).await.unwrap(), UpsertOutcome::Updated);

        let stored = repo.get(&first.identity).await.unwrap().unwrap();
        assert_eq!(stored.title, "Corrected title");
        assert_eq!(stored.first_seen_at.timestamp_micros(), first.first_seen_at.timestamp_micros());
        assert_eq!(stored.last_seen_at.timestamp_micros(), again.last_seen_at.timestamp_micros());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_round_trips_all_fields() {
        let repo = repo();
        let mut p = sample_paper("https://rbi.org.in/wp/1", None);
        p.abstract_text = None;
        p.matched_keyword = None;
        p.is_institutional_override = true;
        repo.upsert(&p).await.unwrap();

        let stored = repo.get(&p.identity).await.unwrap().unwrap();
        assert_eq!(stored.authors, p.authors);
        assert_eq!(stored.publication_date, None);
        assert_eq!(stored.abstract_text, None);
        assert!(stored.is_institutional_override);
        assert!(repo.get("https://nowhere.example/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let repo = repo();
        let old = sample_paper("https://a.example/old", Some("2024-01-05"));
        let new = sample_paper("https://a.example/new", Some("2025-02-01"));
        let undated = sample_paper("https://a.example/undated", None);
        let mut rbi = sample_paper("https://rbi.org.in/x", Some("2024-07-01"));
        rbi.source_name = "RBI".to_string();
        rbi.category = "policy".to_string();
        rbi.is_institutional_override = true;
        for p in [&old, &new, &undated, &rbi] {
            repo.upsert(p).await.unwrap();
        }

        let all = repo.query(&PaperQuery::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.identity.as_str()).collect();
        assert_eq!(
            ids,
            vec!["https://a.example/new", "https://rbi.org.in/x", "https://a.example/old", "https://a.example/undated"]
        );

        let since = PaperQuery { since: NaiveDate::from_ymd_opt(2024, 6, 1), ..PaperQuery::default() };
        assert_eq!(repo.query(&since).await.unwrap().len(), 3);

        let policy = PaperQuery { category: Some("policy".to_string()), ..PaperQuery::default() };
        assert_eq!(repo.query(&policy).await.unwrap().len(), 1);

        let inst = PaperQuery { institutional_only: true, ..PaperQuery::default() };
        assert_eq!(repo.query(&inst).await.unwrap()[0].source_name, "RBI");

        let limited = PaperQuery { limit: Some(2), ..PaperQuery::default() };
        assert_eq!(repo.query(&limited).await.unwrap().len(), 2);

        assert_eq!(repo.sources().await.unwrap(), vec!["NBER".to_string(), "RBI".to_string()]);
        assert_eq!(repo.categories().await.unwrap(), vec!["economics".to_string(), "policy".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_of_one_identity_leave_one_row() {
        let repo = repo();
        let p = sample_paper("https://a.example/same", Some("2024-09-09"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                let p = p.clone();
                tokio::spawn(async move { repo.upsert(&p).await.unwrap() })
            })
            .collect();

        let mut inserted = 0;
        for h in handles {
            if h.await.unwrap() == UpsertOutcome::Inserted {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.db");
        let p = sample_paper("https://a.example/durable", Some("2024-04-04"));
        {
            let db = Database::open(&path).unwrap();
            db.initialize().unwrap();
            PaperRepository::new(Arc::new(db)).upsert(&p).await.unwrap();
        }
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();
        let repo = PaperRepository::new(Arc::new(db));
        assert!(repo.exists(&p.identity).await.unwrap());
    }
}
