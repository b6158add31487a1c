use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::PapertrailError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; papertrail/0.1; +https://github.com/papertrail/papertrail)";

/// An HTTP client that only talks to hosts registered on its allowlist.
///
/// The allowlist is filled from the configured source endpoints before
/// any fetcher runs, so a scraper that follows an unexpected link to a
/// third-party host fails instead of wandering off.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    allowlist: HashSet<String>,
    timeout: Duration,
}

impl HttpClient {
    /// Builds a client with a per-request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, PapertrailError> {
        Self::build(timeout, user_agent, false)
    }

    /// Same as [`HttpClient::new`] but accepts invalid TLS certificates.
    /// Only for sources whose operators serve broken chains.
    pub fn insecure(timeout: Duration, user_agent: &str) -> Result<Self, PapertrailError> {
        Self::build(timeout, user_agent, true)
    }

    fn build(timeout: Duration, user_agent: &str, accept_invalid_certs: bool) -> Result<Self, PapertrailError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| PapertrailError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist: HashSet::new(), timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_ascii_lowercase());
    }

    /// Allows the host of `url`. Returns false when the URL has no host.
    pub fn allow_url(&mut self, url: &str) -> bool {
        match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(host) => {
                self.allow_domain(&host);
                true
            }
            None => false,
        }
    }

    /// Validates if a URL is permitted under the current allowlist.
    /// Subdomains of an allowed host are permitted too.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        let host = host.to_ascii_lowercase();
        self.allowlist
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }

    /// GET request builder, refused for hosts outside the allowlist.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, PapertrailError> {
        if !self.is_allowed(url) {
            return Err(PapertrailError::Security(format!(
                "host not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }

    /// Fetches `url` and returns the body, mapping non-2xx responses to
    /// [`PapertrailError::Status`].
    pub async fn get_text(&self, url: &str) -> Result<String, PapertrailError> {
        let resp = self.get(url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PapertrailError::Status { status: status.as_u16(), url: url.to_string() });
        }
        let body = resp.text().await?;
        debug!(url, bytes = body.len(), "fetched");
        Ok(body)
    }

    /// Fetches `url` and decodes the body as JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, PapertrailError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), DEFAULT_USER_AGENT).unwrap()
    }

    #[test]
    fn test_allowlist_exact_and_subdomain() {
        let mut c = client();
        c.allow_domain("rbi.org.in");
        assert!(c.is_allowed("https://rbi.org.in/Scripts/x.aspx"));
        assert!(c.is_allowed("https://www.rbi.org.in/Scripts/x.aspx"));
        assert!(!c.is_allowed("https://evilrbi.org.in/"));
        assert!(!c.is_allowed("https://example.com/"));
        assert!(!c.is_allowed("not a url"));
    }

    #[test]
    fn test_allow_url_extracts_host() {
        let mut c = client();
        assert!(c.allow_url("https://WWW.NBER.org/rss/new.xml"));
        assert!(c.is_allowed("https://www.nber.org/papers/w1"));
        assert!(!c.allow_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_get_refuses_unlisted_host() {
        let c = client();
        let err = c.get("https://example.com/").unwrap_err();
        assert!(matches!(err, PapertrailError::Security(_)));
    }

    #[tokio::test]
    async fn test_get_text_maps_status_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ok");
                then.status(200).body("hello");
            })
            .await;

        let mut c = client();
        assert!(c.allow_url(&server.base_url()));

        let body = c.get_text(&server.url("/ok")).await.unwrap();
        assert_eq!(body, "hello");

        let err = c.get_text(&server.url("/missing")).await.unwrap_err();
        assert!(matches!(err, PapertrailError::Status { status: 404, .. }));
    }
}
