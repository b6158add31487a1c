//! IDEAS/RePEc series listings, used for institutions that publish their
//! working papers through RePEc (IGIDR, ISI Delhi). The configured series
//! path, e.g. `ind/igiwpp`, picks both the listing page and which paper
//! links belong to it.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::split_authors;

const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref ITEM: Selector = Selector::parse("li").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref AUTHORS: Selector = Selector::parse("i").unwrap();
    static ref YEAR: Regex = Regex::new(r"\b((?:19|20)\d{2})\b").unwrap();
    static ref BY_AUTHORS: Regex = Regex::new(r"(?i)\bby\s+(.+?)(?:\s*\(|\s*$)").unwrap();
}

pub(super) fn default_url(series: &str) -> String {
    format!("https://ideas.repec.org/s/{}.html", series.trim_matches('/'))
}

fn authors_from(text: &str) -> Vec<String> {
    split_authors(&text.replace(" & ", "; "))
}

pub(super) fn parse(doc: &Html, series: &str) -> Vec<RawItem> {
    let paper_path = format!("/p/{}/", series.trim_matches('/'));
    let mut items = Vec::new();

    for li in doc.select(&ITEM) {
        let Some(link) = li.select(&LINK).find(|a| href_of(*a).is_some_and(|h| h.contains(&paper_path))) else {
            continue;
        };
        let Some(href) = href_of(link) else { continue };
        let title = text_of(link);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let rest = text_of(li).replacen(&title, "", 1);

        let mut item = RawItem::new(href, title);
        item.date = YEAR
            .captures(&rest)
            .and_then(|c| c[1].parse::<i32>().ok())
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
        item.authors = match li.select(&AUTHORS).next() {
            Some(names) => authors_from(&text_of(names)),
            None => BY_AUTHORS
                .captures(&rest)
                .map(|c| authors_from(&c[1]))
                .unwrap_or_default(),
        };
        items.push(item);
    }

    items
}
