//! Ashoka University Centre for Economic Data and Analysis. The
//! researchers' corner page is a loose grid of cards; each card links to
//! its post on the CEDA site and may carry a date stamp.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::parse_date;

pub(super) const DEFAULT_URL: &str = "https://ceda.ashoka.edu.in/researchers-corner/";

const SITE: &str = "ceda.ashoka.edu.in";
const MIN_TITLE_CHARS: usize = 15;

lazy_static! {
    static ref CARD: Selector = Selector::parse("article, div, li").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref STAMP: Selector = Selector::parse("time[class], span[class]").unwrap();
}

/// Links back into the CEDA site, other than the listing page itself.
fn post_link(card: ElementRef<'_>) -> Option<ElementRef<'_>> {
    card.select(&LINK).find(|a| {
        href_of(*a).is_some_and(|h| h.contains(SITE) && h.trim_end_matches('/') != DEFAULT_URL.trim_end_matches('/'))
    })
}

/// Wrappers around several cards would pair the first link with whatever
/// date comes first, so only the innermost card holding a post link counts.
fn is_innermost(card: ElementRef<'_>) -> bool {
    !card.select(&CARD).any(|inner| post_link(inner).is_some())
}

fn parse_card(card: ElementRef<'_>) -> Option<RawItem> {
    let link = post_link(card)?;
    if !is_innermost(card) {
        return None;
    }
    let title = text_of(link);
    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }

    let mut item = RawItem::new(href_of(link)?, title);
    item.date = card
        .select(&STAMP)
        .find(|el| el.value().classes().any(|c| c.to_ascii_lowercase().contains("date")))
        .and_then(|el| parse_date(&text_of(el)));
    Some(item)
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&CARD).filter_map(parse_card).collect()
}
