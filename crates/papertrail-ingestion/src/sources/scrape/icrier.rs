//! Indian Council for Research on International Economic Relations
//! working papers.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::{href_of, text_of, RawItem};

pub(super) const DEFAULT_URL: &str = "https://icrier.org/publications_category/working-papers/";

const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href*='/publications/']").unwrap();
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&LINK)
        .filter_map(|link| {
            let href = href_of(link)?;
            if href.contains("category") || href.contains("categorie") {
                return None;
            }
            let title = text_of(link);
            (title.chars().count() >= MIN_TITLE_CHARS).then(|| RawItem::new(href, title))
        })
        .collect()
}
