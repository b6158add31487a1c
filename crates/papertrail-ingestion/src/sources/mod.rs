//! Source fetchers.
//!
//! Every configured source becomes one [`SourceFetcher`]. `produce`
//! returns a lazy stream of candidates: item-level problems surface as
//! [`FetchError::Malformed`] entries and the stream carries on, while a
//! transport-level error is the last item the stream yields.

pub mod feed;
pub mod listing;
pub mod scrape;

use chrono::NaiveDate;
use futures::stream::BoxStream;
use papertrail_common::{HttpClient, PapertrailError};
use papertrail_config::{SourceKind, SourceSpec};
use thiserror::Error;

use crate::models::Candidate;

pub use feed::FeedFetcher;
pub use listing::ListingFetcher;
pub use scrape::ScrapeFetcher;

pub type CandidateStream<'a> = BoxStream<'a, Result<Candidate, FetchError>>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request blocked: {0}")]
    Blocked(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("malformed item: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Item-level errors skip one record; everything else ends the source.
    pub fn is_item_level(&self) -> bool {
        matches!(self, FetchError::Malformed(_))
    }
}

impl From<PapertrailError> for FetchError {
    fn from(err: PapertrailError) -> Self {
        match err {
            PapertrailError::Http(e) => FetchError::Http(e),
            PapertrailError::Status { status, url } => FetchError::Status { status, url },
            PapertrailError::Security(msg) => FetchError::Blocked(msg),
            other => FetchError::UnexpectedShape(other.to_string()),
        }
    }
}

/// A configured source that can be asked for its candidates.
pub trait SourceFetcher: Send + Sync {
    /// Lazy, finite, possibly empty sequence of candidates. Pages are
    /// requested only as the stream is polled.
    fn produce(&self) -> CandidateStream<'_>;
}

/// Endpoint URLs a validated source will contact.
pub fn endpoints_for(spec: &SourceSpec) -> Vec<String> {
    match &spec.kind {
        SourceKind::Feed { url } | SourceKind::Listing { url, .. } => vec![url.clone()],
        SourceKind::Scrape { layout, url, series } => {
            scrape::endpoints(*layout, url.as_deref(), series.as_deref())
        }
    }
}

/// Build the fetcher for a validated source. `client` must already allow
/// the hosts returned by [`endpoints_for`].
pub fn build_fetcher(spec: &SourceSpec, client: HttpClient, cutoff: NaiveDate) -> Box<dyn SourceFetcher> {
    match &spec.kind {
        SourceKind::Feed { url } => Box::new(FeedFetcher::new(url.clone(), client)),
        SourceKind::Scrape { layout, url, series } => Box::new(ScrapeFetcher::new(
            *layout,
            url.clone(),
            series.clone(),
            client,
        )),
        SourceKind::Listing { url, rules } => {
            Box::new(ListingFetcher::new(url.clone(), rules.clone(), client, cutoff))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papertrail_config::ScrapeLayout;

    #[test]
    fn test_item_level_errors() {
        assert!(FetchError::Malformed("no title".into()).is_item_level());
        assert!(!FetchError::Timeout(5).is_item_level());
        assert!(!FetchError::UnexpectedShape("html".into()).is_item_level());
    }

    #[test]
    fn test_security_errors_map_to_blocked() {
        let err: FetchError = PapertrailError::Security("evil.example".into()).into();
        assert!(matches!(err, FetchError::Blocked(_)));
    }

    #[test]
    fn test_endpoints_for_scrape_defaults() {
        let spec = SourceSpec {
            name: "SEBI".into(),
            kind: SourceKind::Scrape { layout: ScrapeLayout::Sebi, url: None, series: None },
            category: "finance".into(),
            institutional: true,
            accept_invalid_certs: false,
        };
        let urls = endpoints_for(&spec);
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|u| u.starts_with("https://www.sebi.gov.in/")));
    }
}
