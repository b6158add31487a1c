use thiserror::Error;

#[derive(Debug, Error)]
pub enum PapertrailError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security policy violation: {0}")]
    Security(String),
}

pub type Result<T> = std::result::Result<T, PapertrailError>;
