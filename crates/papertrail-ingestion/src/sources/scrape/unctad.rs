//! UNCTAD publications. Dates appear as "DD Mon YYYY" somewhere in the
//! link's enclosing block.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::{ancestor, href_of, lines_of, text_of, RawItem};
use crate::normalise::find_date_in_text;

pub(super) const DEFAULT_URL: &str = "https://unctad.org/publications";

const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href*='/publication/']").unwrap();
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&LINK)
        .filter_map(|link| {
            let href = href_of(link)?;
            if href.contains('#') {
                return None;
            }
            let title = text_of(link);
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let mut item = RawItem::new(href, title);
            item.date = ancestor(link, &["div", "article", "li"]).and_then(|block| find_date_in_text(&lines_of(block)));
            Some(item)
        })
        .collect()
}
