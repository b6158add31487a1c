//! Paginated JSON listing fetcher.
//!
//! Pages are requested one at a time as the stream is consumed. Paging
//! stops on an empty page, after `max_pages`, or once every dated record
//! on a page predates the cutoff.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use papertrail_common::HttpClient;
use papertrail_config::ListingRules;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{CandidateStream, FetchError, SourceFetcher};
use crate::models::Candidate;
use crate::normalise::{clean_abstract, clean_text, parse_date, resolve_link, split_authors};

const PAGE_PLACEHOLDER: &str = "{page}";

pub struct ListingFetcher {
    url: String,
    rules: ListingRules,
    client: HttpClient,
    cutoff: NaiveDate,
}

/// One decoded page plus whether paging should continue after it.
struct Page {
    items: Vec<Result<Candidate, FetchError>>,
    more: bool,
}

impl ListingFetcher {
    pub fn new(url: String, rules: ListingRules, client: HttpClient, cutoff: NaiveDate) -> Self {
        Self { url, rules, client, cutoff }
    }

    /// URL for page `page`: substitute `{page}` or set the page parameter.
    pub fn page_url(&self, page: u32) -> Result<String, FetchError> {
        if self.url.contains(PAGE_PLACEHOLDER) {
            return Ok(self.url.replace(PAGE_PLACEHOLDER, &page.to_string()));
        }
        let mut url = Url::parse(&self.url)
            .map_err(|e| FetchError::UnexpectedShape(format!("bad listing URL {}: {}", self.url, e)))?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| *k != self.rules.page_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.rules.page_param, &page.to_string());
        Ok(url.to_string())
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_page(&self, page: u32) -> Result<Page, FetchError> {
        let url = self.page_url(page)?;
        let body = self.client.get_json(&url).await?;
        let decoded = decode_page(&body, &self.rules, &url, self.cutoff)?;
        debug!(records = decoded.items.len(), more = decoded.more, "Listing page decoded");
        Ok(decoded)
    }
}

impl SourceFetcher for ListingFetcher {
    fn produce(&self) -> CandidateStream<'_> {
        let first = self.rules.first_page;
        let last = first.saturating_add(self.rules.max_pages.saturating_sub(1));

        stream::unfold(Some(first), move |next| async move {
            let page = next?;
            match self.fetch_page(page).await {
                Ok(decoded) => {
                    let next = (decoded.more && page < last).then_some(page + 1);
                    Some((decoded.items, next))
                }
                Err(e) => Some((vec![Err(e)], None)),
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

fn decode_page(body: &Value, rules: &ListingRules, page_url: &str, cutoff: NaiveDate) -> Result<Page, FetchError> {
    let records = body
        .pointer(&rules.items)
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::UnexpectedShape(format!("no record array at '{}' in {}", rules.items, page_url)))?;

    if records.is_empty() {
        return Ok(Page { items: Vec::new(), more: false });
    }

    let base = Url::parse(page_url).ok();
    let items: Vec<_> = records.iter().map(|r| map_record(r, rules, base.as_ref())).collect();

    let dates: Vec<NaiveDate> = items
        .iter()
        .filter_map(|i| i.as_ref().ok().and_then(|c| c.publication_date))
        .collect();
    let all_stale = !dates.is_empty() && dates.iter().all(|d| *d < cutoff);

    Ok(Page { items, more: !all_stale })
}

fn string_at<'a>(record: &'a Value, pointer: &str) -> Option<&'a str> {
    record.pointer(pointer).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn authors_at(record: &Value, pointer: &str) -> Vec<String> {
    match record.pointer(pointer) {
        Some(Value::String(s)) => split_authors(s),
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(clean_text(s)),
                Value::Object(o) => o.get("name").and_then(Value::as_str).map(clean_text),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn map_record(record: &Value, rules: &ListingRules, base: Option<&Url>) -> Result<Candidate, FetchError> {
    let title = string_at(record, &rules.title)
        .map(clean_text)
        .ok_or_else(|| FetchError::Malformed(format!("record without title at '{}'", rules.title)))?;

    let raw_link = string_at(record, &rules.link)
        .ok_or_else(|| FetchError::Malformed(format!("record '{}' without link at '{}'", title, rules.link)))?;
    let link = match base {
        Some(base) => resolve_link(base, raw_link),
        None => Some(raw_link.to_string()),
    }
    .ok_or_else(|| FetchError::Malformed(format!("record '{}' has unusable link '{}'", title, raw_link)))?;

    let date = rules.date.as_deref().and_then(|p| string_at(record, p)).and_then(parse_date);
    let authors = rules.authors.as_deref().map(|p| authors_at(record, p)).unwrap_or_default();
    let abstract_text = clean_abstract(rules.abstract_text.as_deref().and_then(|p| string_at(record, p)));

    Ok(Candidate::new(link, title)
        .with_authors(authors)
        .with_abstract(abstract_text)
        .with_date(date))
}
