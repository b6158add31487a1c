//! Configuration loading for papertrail.
//! Reads papertrail.toml from the current directory or the path in the
//! PAPERTRAIL_CONFIG env var.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod keywords;
pub mod source;

pub use source::{ListingRules, ScrapeLayout, SourceEntry, SourceKind, SourceSpec};

pub const CONFIG_ENV_VAR: &str = "PAPERTRAIL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "papertrail.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("source '{source_name}': unknown fetch kind '{kind}'")]
    UnknownKind { source_name: String, kind: String },

    #[error("source '{source_name}': missing required field '{field}'")]
    MissingField { source_name: String, field: &'static str },

    #[error("source '{source_name}': unknown scrape layout '{layout}'")]
    UnknownLayout { source_name: String, layout: String },

    #[error("source '{source_name}': {message}")]
    InvalidValue { source_name: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Records published before this date are never stored.
    #[serde(default = "default_cutoff_date")]
    pub cutoff_date: NaiveDate,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

pub fn default_cutoff_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cutoff_date: default_cutoff_date(),
            database: DatabaseConfig::default(),
            http: HttpConfig::default(),
            relevance: RelevanceConfig::default(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "./data/papers.db".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for a whole source, all of its pages included.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Number of sources fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs()        -> u64    { 30 }
fn default_source_timeout_secs() -> u64    { 120 }
fn default_concurrency()         -> usize  { 4 }
fn default_user_agent()          -> String {
    "Mozilla/5.0 (compatible; papertrail/0.1; +https://github.com/papertrail/papertrail)".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            source_timeout_secs: default_source_timeout_secs(),
            concurrency: default_concurrency(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default = "keywords::default_keywords")]
    pub keywords: Vec<String>,
    /// Source names exempt from keyword filtering, in addition to
    /// descriptors marked `institutional = true`.
    #[serde(default = "keywords::default_institutional_sources")]
    pub institutional_sources: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            keywords: keywords::default_keywords(),
            institutional_sources: keywords::default_institutional_sources(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from PAPERTRAIL_CONFIG, or
    /// from papertrail.toml in the current directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Names of every source exempt from relevance filtering.
    pub fn institutional_names(&self) -> Vec<String> {
        let mut names = self.relevance.institutional_sources.clone();
        for (i, entry) in self.sources.iter().enumerate() {
            if entry.is_institutional() {
                names.push(entry.display_name(i));
            }
        }
        names.sort();
        names.dedup();
        names
    }
}
