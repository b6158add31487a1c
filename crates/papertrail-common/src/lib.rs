//! papertrail-common: shared error type and the allowlisted HTTP client
//! used by every fetcher.

pub mod error;
pub mod http;

pub use error::{PapertrailError, Result};
pub use http::HttpClient;
