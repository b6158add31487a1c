//! Centre for Policy Research working papers. Authors, when present, are
//! in a span or paragraph whose class mentions "author".

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{ancestor, href_of, text_of, RawItem};
use crate::normalise::split_authors;

pub(super) const DEFAULT_URL: &str = "https://cprindia.org/working-papers/";

const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href*='/workingpapers/']").unwrap();
    static ref TEXT_BLOCK: Selector = Selector::parse("span[class], p[class]").unwrap();
}

fn authors_near(link: ElementRef<'_>) -> Vec<String> {
    let Some(container) = ancestor(link, &["div", "article", "li"]) else { return Vec::new() };
    container
        .select(&TEXT_BLOCK)
        .find(|el| el.value().classes().any(|c| c.to_ascii_lowercase().contains("author")))
        .map(|el| split_authors(&text_of(el)))
        .unwrap_or_default()
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&LINK)
        .filter_map(|link| {
            let href = href_of(link)?;
            let title = text_of(link);
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let mut item = RawItem::new(href, title);
            item.authors = authors_near(link);
            Some(item)
        })
        .collect()
}
