//! Syndication feed fetcher: RSS 2.0, RSS 1.0 (RDF) and Atom.

use futures::stream::{self, StreamExt};
use papertrail_common::HttpClient;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument};
use url::Url;

use super::{CandidateStream, FetchError, SourceFetcher};
use crate::models::Candidate;
use crate::normalise::{clean_abstract, clean_text, parse_date, resolve_link, split_authors, strip_html};

pub struct FeedFetcher {
    url: String,
    client: HttpClient,
}

impl FeedFetcher {
    pub fn new(url: String, client: HttpClient) -> Self {
        Self { url, client }
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_entries(&self) -> Vec<Result<Candidate, FetchError>> {
        let body = match self.client.get_text(&self.url).await {
            Ok(body) => body,
            Err(e) => return vec![Err(e.into())],
        };
        match parse_feed(&body, &self.url) {
            Ok(entries) => {
                debug!(entries = entries.len(), "Feed parsed");
                entries
            }
            Err(e) => vec![Err(e)],
        }
    }
}

impl SourceFetcher for FeedFetcher {
    fn produce(&self) -> CandidateStream<'_> {
        stream::once(self.fetch_entries()).flat_map(stream::iter).boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Author,
    Published,
    Updated,
}

#[derive(Default)]
struct EntryBuilder {
    title: String,
    link: Option<String>,
    summary: String,
    content: String,
    authors: Vec<String>,
    author_buf: String,
    published: Option<String>,
    updated: Option<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Author => &mut self.author_buf,
            Field::Link => self.link.get_or_insert_with(String::new),
            Field::Published => self.published.get_or_insert_with(String::new),
            Field::Updated => self.updated.get_or_insert_with(String::new),
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }

    fn finish_author(&mut self) {
        let name = clean_text(&self.author_buf);
        if !name.is_empty() {
            self.authors.push(name);
        }
        self.author_buf.clear();
    }

    fn build(self, base: Option<&Url>) -> Result<Candidate, FetchError> {
        let title = strip_html(&self.title);
        if title.is_empty() {
            return Err(FetchError::Malformed("feed entry without title".to_string()));
        }

        let raw_link = self.link.as_deref().map(str::trim).unwrap_or_default();
        let link = match base {
            Some(base) => resolve_link(base, raw_link),
            None => Url::parse(raw_link).ok().map(|u| u.to_string()),
        }
        .ok_or_else(|| FetchError::Malformed(format!("feed entry '{}' without usable link", title)))?;

        let abstract_text = if self.summary.trim().is_empty() {
            clean_abstract(Some(&self.content))
        } else {
            clean_abstract(Some(&self.summary))
        };

        let authors = match self.authors.as_slice() {
            [single] => split_authors(single),
            _ => self.authors,
        };

        let date = self
            .published
            .as_deref()
            .and_then(parse_date)
            .or_else(|| self.updated.as_deref().and_then(parse_date));

        Ok(Candidate::new(link, title)
            .with_authors(authors)
            .with_abstract(abstract_text)
            .with_date(date))
    }
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" | b"summary" | b"abstract" => Some(Field::Summary),
        b"content" | b"encoded" => Some(Field::Content),
        b"author" | b"creator" | b"name" => Some(Field::Author),
        b"pubDate" | b"date" | b"published" | b"issued" => Some(Field::Published),
        b"updated" | b"modified" => Some(Field::Updated),
        _ => None,
    }
}

fn href_of(e: &BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return None;
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a feed document. A document that is not a feed at all is a
/// source-level error; a broken entry is an item-level one.
pub fn parse_feed(xml: &str, feed_url: &str) -> Result<Vec<Result<Candidate, FetchError>>, FetchError> {
    let base = Url::parse(feed_url).ok();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut root_seen = false;
    let mut current: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if !root_seen {
                    if !matches!(name, b"rss" | b"RDF" | b"feed") {
                        return Err(FetchError::UnexpectedShape(format!(
                            "not a syndication feed (root <{}>)",
                            String::from_utf8_lossy(name)
                        )));
                    }
                    root_seen = true;
                } else if matches!(name, b"item" | b"entry") {
                    current = Some(EntryBuilder::default());
                    field = None;
                } else if let Some(entry) = current.as_mut() {
                    let href = if name == b"link" { href_of(e) } else { None };
                    if let Some(href) = href {
                        entry.link.get_or_insert(href);
                    } else if let Some(f) = field_for(name) {
                        // Atom <author> wraps <name>; keep collecting into the same buffer.
                        if !(f == Field::Author && field == Some(Field::Author)) {
                            field = Some(f);
                        }
                    } else if field == Some(Field::Author) {
                        field = None;
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"link" {
                    if let (Some(entry), Some(href)) = (current.as_mut(), href_of(e)) {
                        entry.link.get_or_insert(href);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        Err(_) => String::from_utf8_lossy(e).into_owned(),
                    };
                    entry.push_text(f, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    entry.push_text(f, &text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry.build(base.as_ref()));
                        }
                        field = None;
                    }
                    b"author" | b"creator" => {
                        if let Some(entry) = current.as_mut() {
                            entry.finish_author();
                        }
                        field = None;
                    }
                    b"name" => {}
                    other => {
                        if field_for(other).is_some() {
                            field = None;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::UnexpectedShape(format!(
                    "invalid XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(FetchError::UnexpectedShape("empty feed document".to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Journal X</title>
    <link>https://journalx.example.org</link>
    <item>
      <title>Bank credit and &lt;i&gt;growth&lt;/i&gt; in Indian states</title>
      <link>https://journalx.example.org/articles/1?utm_source=rss</link>
      <description><![CDATA[<p>We study credit &amp; growth.</p>]]></description>
      <dc:creator>Ila Patnaik; Ajay Shah</dc:creator>
      <pubDate>Tue, 05 Mar 2024 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>   </title>
      <link>https://journalx.example.org/articles/2</link>
    </item>
    <item>
      <title>Optimal taxation</title>
      <link>/articles/3</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Working papers</title>
  <entry>
    <title type="html">Monetary transmission in India</title>
    <link rel="alternate" href="https://www.nber.org/papers/w32001"/>
    <link rel="related" href="https://www.nber.org/system/files/w32001.pdf"/>
    <author><name>Raghuram Rajan</name><email>r@example.org</email></author>
    <author><name>Rakesh Mohan</name></author>
    <updated>2024-06-02T00:00:00Z</updated>
    <published>2024-05-30T00:00:00Z</published>
    <summary>Policy rate pass-through.</summary>
  </entry>
</feed>"#;

    const RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel><title>SSRN</title></channel>
  <item>
    <title>Rupee volatility</title>
    <link>https://papers.ssrn.com/sol3/papers.cfm?abstract_id=1</link>
    <dc:date>2025-01-15</dc:date>
  </item>
</rdf:RDF>"#;

    #[test]
    fn test_parse_rss_items() {
        let entries = parse_feed(RSS, "https://journalx.example.org/rss").unwrap();
        assert_eq!(entries.len(), 3);

        let first = entries[0].as_ref().unwrap();
        assert_eq!(first.title, "Bank credit and growth in Indian states");
        assert_eq!(first.url, "https://journalx.example.org/articles/1?utm_source=rss");
        assert_eq!(first.abstract_text.as_deref(), Some("We study credit & growth."));
        assert_eq!(first.authors, vec!["Ila Patnaik", "Ajay Shah"]);
        assert_eq!(first.publication_date, NaiveDate::from_ymd_opt(2024, 3, 5));

        assert!(matches!(entries[1], Err(FetchError::Malformed(_))));

        let third = entries[2].as_ref().unwrap();
        assert_eq!(third.url, "https://journalx.example.org/articles/3");
        assert_eq!(third.abstract_text, None);
        assert_eq!(third.publication_date, None);
    }

    #[test]
    fn test_parse_atom_entry() {
        let entries = parse_feed(ATOM, "https://www.nber.org/rss").unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries[0].as_ref().unwrap();
        assert_eq!(entry.url, "https://www.nber.org/papers/w32001");
        assert_eq!(entry.authors, vec!["Raghuram Rajan", "Rakesh Mohan"]);
        assert_eq!(entry.publication_date, NaiveDate::from_ymd_opt(2024, 5, 30));
        assert_eq!(entry.abstract_text.as_deref(), Some("Policy rate pass-through."));
    }

    #[test]
    fn test_parse_rdf_items() {
        let entries = parse_feed(RDF, "https://papers.ssrn.com/rss").unwrap();
        let entry = entries[0].as_ref().unwrap();
        assert_eq!(entry.title, "Rupee volatility");
        assert_eq!(entry.publication_date, NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    #[test]
    fn test_non_feed_documents_are_source_errors() {
        let html = "<html><body><p>Maintenance</p></body></html>";
        assert!(matches!(
            parse_feed(html, "https://a.example/rss"),
            Err(FetchError::UnexpectedShape(_))
        ));
        assert!(matches!(parse_feed("", "https://a.example/rss"), Err(FetchError::UnexpectedShape(_))));
    }

    #[tokio::test]
    async fn test_feed_fetcher_over_http() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rss");
                then.status(200).header("content-type", "application/rss+xml").body(RSS);
            })
            .await;

        let mut client = HttpClient::new(Duration::from_secs(5), "test").unwrap();
        client.allow_url(&server.base_url());
        let fetcher = FeedFetcher::new(server.url("/rss"), client);

        let items: Vec<_> = fetcher.produce().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items.iter().filter(|i| i.is_ok()).count(), 2);
    }

    #[tokio::test]
    async fn test_feed_fetcher_reports_http_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rss");
                then.status(503);
            })
            .await;

        let mut client = HttpClient::new(Duration::from_secs(5), "test").unwrap();
        client.allow_url(&server.base_url());
        let fetcher = FeedFetcher::new(server.url("/rss"), client);

        let items: Vec<_> = fetcher.produce().collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(FetchError::Status { status: 503, .. })));
    }
}
