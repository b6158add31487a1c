//! XKDR Forum papers. Each card holds the paper link, a "By ..." author
//! line and a "13 Jan 2026" date.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use super::{ancestor, href_of, lines_of, text_of, RawItem};
use crate::normalise::{find_date_in_text, split_authors};

pub(super) const DEFAULT_URL: &str = "https://www.xkdr.org/papers-list";

const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href*='/paper/']").unwrap();
    static ref TYPE_PREFIX: Regex = Regex::new(r"^(?:Working Paper|Publication|Report|Book)\s*").unwrap();
    static ref BY_LINE: Regex = Regex::new(r"By\s+([^,\n]+(?:,[ \t]*[^,\n]+)*)").unwrap();
    static ref OTHERS: Regex = Regex::new(r"\s+and\s+\d+\s+others?$").unwrap();
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    let mut items = Vec::new();

    for link in doc.select(&LINK) {
        let Some(href) = href_of(link) else { continue };
        let title = TYPE_PREFIX.replace(&text_of(link), "").trim().to_string();
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let mut item = RawItem::new(href, title);
        if let Some(card) = ancestor(link, &["div", "article", "li", "section"]) {
            let text = lines_of(card);
            item.date = find_date_in_text(&text);
            if let Some(caps) = BY_LINE.captures(&text) {
                let names = OTHERS.replace(caps[1].trim(), " et al.");
                item.authors = split_authors(&names);
            }
        }
        items.push(item);
    }

    items
}
