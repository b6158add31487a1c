//! Kiel Institute for the World Economy publication search. Teasers give
//! title, authors and a "12/2025" month stamp.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::{parse_date, split_authors};

pub(super) const DEFAULT_URL: &str = "https://www.kielinstitut.de/publications/?q=India";

lazy_static! {
    static ref TEASER: Selector = Selector::parse("article.publication-page-teaser").unwrap();
    static ref HEADLINE: Selector = Selector::parse(".publication-page-teaser__headline a").unwrap();
    static ref AUTHOR: Selector = Selector::parse(".publication-page-teaser__author").unwrap();
    static ref PUBLISHED: Selector = Selector::parse(".published-date").unwrap();
    static ref MONTH_STAMP: Regex = Regex::new(r"\b(\d{1,2}/\d{4})\b").unwrap();
}

fn parse_teaser(teaser: ElementRef<'_>) -> Option<RawItem> {
    let headline = teaser.select(&HEADLINE).next()?;
    let title = text_of(headline);
    if title.is_empty() {
        return None;
    }
    let href = href_of(headline)?;

    let mut item = RawItem::new(href, title);
    item.authors = teaser
        .select(&AUTHOR)
        .next()
        .map(|a| split_authors(&text_of(a)))
        .unwrap_or_default();
    item.date = teaser
        .select(&PUBLISHED)
        .next()
        .map(text_of)
        .and_then(|text| MONTH_STAMP.captures(&text).and_then(|c| parse_date(&c[1])));
    Some(item)
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&TEASER).filter_map(parse_teaser).collect()
}
