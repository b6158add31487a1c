//! HTML scrape fetcher.
//!
//! Each institution's page rules live in their own module and turn a
//! parsed document into [`RawItem`]s. This module owns what they share:
//! paging, link resolution, per-source deduplication and conversion into
//! candidates.

mod ashoka;
mod cag;
mod cpr;
mod icrier;
mod iima;
mod kiel;
mod ncaer;
mod nipfp;
mod rbi;
mod repec;
mod sebi;
mod unctad;
mod xkdr;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use papertrail_common::HttpClient;
use papertrail_config::ScrapeLayout;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

use super::{CandidateStream, FetchError, SourceFetcher};
use crate::models::Candidate;
use crate::normalise::{clean_abstract, clean_text, resolve_link};

/// One listing entry as read off the page, before link resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawItem {
    pub href: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: Option<String>,
    pub date: Option<NaiveDate>,
}

impl RawItem {
    pub(crate) fn new(href: &str, title: String) -> Self {
        Self { href: href.trim().to_string(), title, ..Self::default() }
    }
}

pub struct ScrapeFetcher {
    layout: ScrapeLayout,
    pages: Vec<String>,
    series: Option<String>,
    client: HttpClient,
}

impl ScrapeFetcher {
    pub fn new(layout: ScrapeLayout, url: Option<String>, series: Option<String>, client: HttpClient) -> Self {
        let pages = endpoints(layout, url.as_deref(), series.as_deref());
        Self { layout, pages, series, client }
    }

    #[instrument(skip(self), fields(layout = %self.layout))]
    async fn fetch_page(&self, url: &str) -> Result<Vec<RawItem>, FetchError> {
        let html = self.client.get_text(url).await?;
        let items = parse_page(self.layout, &html, self.series.as_deref());
        debug!(items = items.len(), "Page scraped");
        Ok(items)
    }
}

impl SourceFetcher for ScrapeFetcher {
    fn produce(&self) -> CandidateStream<'_> {
        let stop_on_empty = self.layout == ScrapeLayout::Cag;

        stream::unfold(Some((0usize, HashSet::new())), move |state| async move {
            let (index, mut seen) = state?;
            let url = self.pages.get(index)?;
            match self.fetch_page(url).await {
                Ok(raw) => {
                    let exhausted = stop_on_empty && raw.is_empty();
                    let items = finish(raw, url, &mut seen);
                    let next = (!exhausted).then_some((index + 1, seen));
                    Some((items, next))
                }
                Err(e) => Some((vec![Err(e)], None)),
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// Pages a scrape source requests, in order. `url` replaces the layout's
/// default endpoint.
pub fn endpoints(layout: ScrapeLayout, url: Option<&str>, series: Option<&str>) -> Vec<String> {
    let base = match url {
        Some(u) => u.to_string(),
        None => match layout {
            ScrapeLayout::Sebi => return sebi::DEFAULT_URLS.iter().map(|u| u.to_string()).collect(),
            ScrapeLayout::Repec => repec::default_url(series.unwrap_or_default()),
            ScrapeLayout::Rbi => rbi::DEFAULT_URL.to_string(),
            ScrapeLayout::Nipfp => nipfp::DEFAULT_URL.to_string(),
            ScrapeLayout::Ncaer => ncaer::DEFAULT_URL.to_string(),
            ScrapeLayout::Icrier => icrier::DEFAULT_URL.to_string(),
            ScrapeLayout::Cpr => cpr::DEFAULT_URL.to_string(),
            ScrapeLayout::Xkdr => xkdr::DEFAULT_URL.to_string(),
            ScrapeLayout::Cag => cag::DEFAULT_URL.to_string(),
            ScrapeLayout::Kiel => kiel::DEFAULT_URL.to_string(),
            ScrapeLayout::Unctad => unctad::DEFAULT_URL.to_string(),
            ScrapeLayout::Ashoka => ashoka::DEFAULT_URL.to_string(),
            ScrapeLayout::Iima => iima::DEFAULT_URL.to_string(),
        },
    };

    if layout == ScrapeLayout::Cag {
        (1..=cag::MAX_PAGES).map(|page| paged_url(&base, page)).collect()
    } else {
        vec![base]
    }
}

/// First page is the bare URL; later pages add `page=N`.
fn paged_url(base: &str, page: u32) -> String {
    if page == 1 {
        return base.to_string();
    }
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("page", &page.to_string());
            url.to_string()
        }
        Err(_) => format!("{}?page={}", base, page),
    }
}

fn parse_page(layout: ScrapeLayout, html: &str, series: Option<&str>) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    match layout {
        ScrapeLayout::Rbi => rbi::parse(&doc),
        ScrapeLayout::Sebi => sebi::parse(&doc),
        ScrapeLayout::Nipfp => nipfp::parse(&doc),
        ScrapeLayout::Ncaer => ncaer::parse(&doc),
        ScrapeLayout::Icrier => icrier::parse(&doc),
        ScrapeLayout::Cpr => cpr::parse(&doc),
        ScrapeLayout::Repec => repec::parse(&doc, series.unwrap_or_default()),
        ScrapeLayout::Xkdr => xkdr::parse(&doc),
        ScrapeLayout::Cag => cag::parse(&doc),
        ScrapeLayout::Kiel => kiel::parse(&doc),
        ScrapeLayout::Unctad => unctad::parse(&doc),
        ScrapeLayout::Ashoka => ashoka::parse(&doc),
        ScrapeLayout::Iima => iima::parse(&doc),
    }
}

/// Resolve links against the page, drop links already produced by this
/// source, and convert the rest into candidates.
fn finish(raw: Vec<RawItem>, page_url: &str, seen: &mut HashSet<String>) -> Vec<Result<Candidate, FetchError>> {
    let base = Url::parse(page_url).ok();
    raw.into_iter()
        .filter_map(|item| {
            let title = clean_text(&item.title);
            let link = base.as_ref().and_then(|b| resolve_link(b, &item.href));
            let Some(link) = link else {
                return Some(Err(FetchError::Malformed(format!(
                    "'{}' has unusable link '{}'",
                    title, item.href
                ))));
            };
            if !seen.insert(link.clone()) {
                return None;
            }
            if title.is_empty() {
                return Some(Err(FetchError::Malformed(format!("{} has no title", link))));
            }
            Some(Ok(Candidate::new(link, title)
                .with_authors(item.authors)
                .with_abstract(clean_abstract(item.abstract_text.as_deref()))
                .with_date(item.date)))
        })
        .collect()
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text content with one text node per line, for line-oriented patterns.
pub(crate) fn lines_of(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join("\n")
}

/// Nearest ancestor whose tag is one of `names`.
pub(crate) fn ancestor<'a>(el: ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| names.contains(&a.value().name()))
}

pub(crate) fn href_of<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
}
