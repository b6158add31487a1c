//! papertrail database layer
//!
//! The ingestion pipeline only sees the [`PaperStore`] contract:
//! existence check, idempotent upsert keyed by identity, and the read
//! query used by renderers. Two implementations ship here:
//!
//! - [`PaperRepository`]: SQLite file via rusqlite, one writer at a time
//! - [`MemoryPaperStore`]: in-process map for tests and dry runs
//!
//! # Example
//!
//! ```rust,no_run
//! use papertrail_db::{Database, PaperRepository, PaperStore, PaperQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./data/papers.db")?;
//!     db.initialize()?;
//!
//!     let papers = PaperRepository::new(std::sync::Arc::new(db));
//!     let recent = papers.query(&PaperQuery::default()).await?;
//!     println!("{} papers", recent.len());
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod memory;
pub mod papers;
pub mod schema;
pub mod store;

pub use database::Database;
pub use error::{DbError, Result};
pub use memory::MemoryPaperStore;
pub use papers::PaperRepository;
pub use schema::{Paper, PaperQuery, TABLE_PAPERS};
pub use store::{PaperStore, UpsertOutcome};
