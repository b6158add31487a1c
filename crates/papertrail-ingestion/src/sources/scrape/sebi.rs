//! Securities and Exchange Board of India: working papers and research
//! papers listings. Paper links are PDFs or detail pages; the row's first
//! parseable cell or span gives the date.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::parse_date;

pub(super) const DEFAULT_URLS: [&str; 2] = [
    "https://www.sebi.gov.in/sebiweb/home/HomeAction.do?doListing=yes&sid=4&ssid=81&smid=104",
    "https://www.sebi.gov.in/sebiweb/home/HomeAction.do?doListing=yes&sid=4&ssid=81&smid=109",
];

const MIN_TITLE_CHARS: usize = 15;

const PAPER_PATH_HINTS: &[&str] = &[".pdf", "/legal/", "/reports/working-papers/", "/reports/research/"];

lazy_static! {
    static ref ROW: Selector = Selector::parse("tr, li").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref DATE_CELL: Selector = Selector::parse("td, span").unwrap();
}

fn is_paper_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    PAPER_PATH_HINTS.iter().any(|hint| lower.contains(hint)) || href.contains("doGet")
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    let mut items = Vec::new();

    for row in doc.select(&ROW) {
        let date = row.select(&DATE_CELL).find_map(|cell| parse_date(&text_of(cell)));

        for link in row.select(&LINK) {
            let Some(href) = href_of(link) else { continue };
            let title = text_of(link);
            if title.chars().count() < MIN_TITLE_CHARS || !is_paper_link(href) {
                continue;
            }
            let mut item = RawItem::new(href, title);
            item.date = date;
            items.push(item);
        }
    }

    items
}
