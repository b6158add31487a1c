//! Comptroller and Auditor General audit reports. The listing is paged;
//! each `div.AuditReportlisting` block carries the title, date, report
//! type, audited entity, sector and usually a PDF link.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::parse_date;

pub(super) const DEFAULT_URL: &str = "https://cag.gov.in/en/audit-report";

/// Listing pages requested per run.
pub(super) const MAX_PAGES: u32 = 3;

const MIN_TITLE_CHARS: usize = 10;

lazy_static! {
    static ref LISTING: Selector = Selector::parse("div.AuditReportlisting").unwrap();
    static ref DETAIL_LINK: Selector = Selector::parse("div.reportDetail a[href]").unwrap();
    static ref DATE: Selector = Selector::parse("span.dtn").unwrap();
    static ref REPORT_TYPE: Selector = Selector::parse("div.reportType span").unwrap();
    static ref ENTITY: Selector = Selector::parse("div.reportIcon h5").unwrap();
    static ref SECTOR: Selector = Selector::parse("div.sectorDetail").unwrap();
    static ref DIV: Selector = Selector::parse("div").unwrap();
    static ref PDF_LINK: Selector = Selector::parse("div.pdfcallBlock a[href]").unwrap();
}

fn first_text(listing: ElementRef<'_>, selector: &Selector) -> Option<String> {
    listing.select(selector).next().map(text_of).filter(|t| !t.is_empty())
}

fn summary(listing: ElementRef<'_>) -> Option<String> {
    let sector = listing
        .select(&SECTOR)
        .next()
        .and_then(|s| s.select(&DIV).nth(1))
        .map(text_of)
        .filter(|t| !t.is_empty());

    let parts: Vec<String> = [
        ("Type", first_text(listing, &REPORT_TYPE)),
        ("Entity", first_text(listing, &ENTITY)),
        ("Sector", sector),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
    .collect();

    (!parts.is_empty()).then(|| format!("CAG Audit Report. {}.", parts.join(". ")))
}

fn parse_listing(listing: ElementRef<'_>) -> Option<RawItem> {
    let detail = listing.select(&DETAIL_LINK).next()?;
    let title = text_of(detail);
    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }

    let pdf = listing
        .select(&PDF_LINK)
        .filter_map(href_of)
        .find(|h| h.to_ascii_lowercase().contains(".pdf"));
    let href = pdf.or_else(|| href_of(detail))?;

    let mut item = RawItem::new(href, title);
    item.date = first_text(listing, &DATE).and_then(|d| parse_date(&d));
    item.abstract_text = summary(listing);
    Some(item)
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    doc.select(&LISTING).filter_map(parse_listing).collect()
}
