//! Reserve Bank of India working papers.
//!
//! One table: a row with a `td.tableheader` cell carries the date for the
//! rows below it; paper rows hold the title link, the authors and
//! usually a PDF link.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use super::{href_of, text_of, RawItem};
use crate::normalise::{parse_date, split_authors};

pub(super) const DEFAULT_URL: &str =
    "https://www.rbi.org.in/Scripts/OccasionalPublications.aspx?head=Working%20Papers";

/// Shorter link texts are navigation, not paper titles.
const MIN_TITLE_CHARS: usize = 20;

lazy_static! {
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref TITLE_LINK: Selector = Selector::parse("a.link2").unwrap();
    static ref ANY_LINK: Selector = Selector::parse("a[href]").unwrap();
}

fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "td")
        .collect()
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    let mut items = Vec::new();
    let mut current_date = None;

    for row in doc.select(&ROW) {
        let cells = cells(row);

        let header = cells
            .iter()
            .find(|c| c.value().classes().any(|cl| cl.eq_ignore_ascii_case("tableheader")));
        if let Some(header) = header {
            current_date = parse_date(&text_of(*header));
            continue;
        }
        if cells.len() < 2 {
            continue;
        }

        let Some(title_link) = cells[0].select(&TITLE_LINK).next() else { continue };
        let title = text_of(title_link);
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let pdf = row
            .select(&ANY_LINK)
            .filter_map(href_of)
            .find(|h| h.to_ascii_uppercase().contains(".PDF"));
        let Some(href) = pdf.or_else(|| href_of(title_link)) else { continue };

        let mut item = RawItem::new(href, title);
        item.authors = split_authors(&text_of(cells[1]));
        item.date = current_date;
        items.push(item);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><body><table class="tablebg">
      <tr><td class="tableheader" colspan="2">Dec 19, 2024</td></tr>
      <tr>
        <td><a class="link2" href="PublicationsView.aspx?id=23100">Inflation Expectations of Households in India</a></td>
        <td>Jibin Jose, Harendra Behera</td>
        <td><a href="https://rbidocs.rbi.org.in/rdocs/Publications/PDFs/WPS12.PDF">PDF</a></td>
      </tr>
      <tr>
        <td><a class="link2" href="PublicationsView.aspx?id=23101">Monetary Transmission Across Bank Groups</a></td>
        <td>Silu Muduli</td>
      </tr>
      <tr><td class="tableheader" colspan="2">Nov 28, 2023</td></tr>
      <tr>
        <td><a class="link2" href="PublicationsView.aspx?id=22000">Home</a></td>
        <td>Nav</td>
      </tr>
      <tr>
        <td><a class="link2" href="PublicationsView.aspx?id=22001">Forecasting Core Inflation with Machine Learning</a></td>
        <td>A. Author</td>
      </tr>
    </table></body></html>"#;

    #[test]
    fn test_parse_rbi_table() {
        let items = parse(&Html::parse_document(PAGE));
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "Inflation Expectations of Households in India");
        assert_eq!(items[0].href, "https://rbidocs.rbi.org.in/rdocs/Publications/PDFs/WPS12.PDF");
        assert_eq!(items[0].authors, vec!["Jibin Jose", "Harendra Behera"]);
        assert_eq!(items[0].date, NaiveDate::from_ymd_opt(2024, 12, 19));

        assert_eq!(items[1].href, "PublicationsView.aspx?id=23101");
        assert_eq!(items[1].date, NaiveDate::from_ymd_opt(2024, 12, 19));

        assert_eq!(items[2].date, NaiveDate::from_ymd_opt(2023, 11, 28));
    }
}
