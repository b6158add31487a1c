//! National Institute of Public Finance and Policy working papers.
//! Titles are `h3` headings; the paper link sits in the heading's parent
//! or grandparent container.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use super::{href_of, text_of, RawItem};

pub(super) const DEFAULT_URL: &str = "https://www.nipfp.org.in/publication-index-page/working-paper-index-page/";

const MIN_TITLE_CHARS: usize = 20;
const INDEX_PATH: &str = "/working-paper-index-page/";

lazy_static! {
    static ref HEADING: Selector = Selector::parse("h3").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
}

fn paper_link(container: ElementRef<'_>) -> Option<&str> {
    container
        .select(&LINK)
        .filter_map(href_of)
        .find(|h| h.contains(INDEX_PATH) && !h.ends_with(INDEX_PATH))
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    let mut items = Vec::new();
    let mut seen_titles = HashSet::new();

    for heading in doc.select(&HEADING) {
        let title = text_of(heading);
        if title.chars().count() < MIN_TITLE_CHARS || seen_titles.contains(&title) {
            continue;
        }

        let parent = heading.parent().and_then(ElementRef::wrap);
        let grandparent = parent.and_then(|p| p.parent()).and_then(ElementRef::wrap);
        let href = [parent, grandparent].into_iter().flatten().find_map(paper_link);

        if let Some(href) = href {
            seen_titles.insert(title.clone());
            items.push(RawItem::new(href, title));
        }
    }

    items
}
