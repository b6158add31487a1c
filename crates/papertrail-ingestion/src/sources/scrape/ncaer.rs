//! National Council of Applied Economic Research publications: any link
//! to a `/publication/<slug>` page.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::{href_of, text_of, RawItem};

pub(super) const DEFAULT_URL: &str = "https://ncaer.org/publication";

const MIN_TITLE_CHARS: usize = 20;

lazy_static! {
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&LINK)
        .filter_map(|link| {
            let href = href_of(link)?;
            let title = text_of(link);
            let is_slug = href.contains("/publication/") && !href.trim_end_matches('/').ends_with("/publication");
            (is_slug && title.chars().count() >= MIN_TITLE_CHARS).then(|| RawItem::new(href, title))
        })
        .collect()
}
