//! IIM Ahmedabad research publications. Titles sit in plain text blocks
//! with no markup of their own; the paper link is the next "Read More"
//! anchor into `/publication/` that follows the block in the document.

use scraper::{ElementRef, Html};

use super::{href_of, text_of, RawItem};

pub(super) const DEFAULT_URL: &str = "https://www.iima.ac.in/faculty-research/research-publications";

const MIN_TITLE_CHARS: usize = 20;
const MAX_TITLE_CHARS: usize = 200;

/// Menu and footer text that also reaches title length.
const CHROME_PHRASES: &[&str] = &[
    "read more",
    "view all",
    "home",
    "faculty",
    "quick links",
    "online payment",
    "verification",
    "contact",
    "about",
    "cat ",
];

fn publication_href<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    if el.value().name() != "a" {
        return None;
    }
    href_of(el).filter(|h| h.contains("/publication/") && !h.contains("/search"))
}

fn looks_like_title(text: &str) -> bool {
    let len = text.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return false;
    }
    let lower = text.to_lowercase();
    if CHROME_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    text.starts_with('"') || text.chars().next().is_some_and(char::is_uppercase)
}

pub(super) fn parse(doc: &Html) -> Vec<RawItem> {
    // Document order, so "next link" is the first publication anchor
    // after the block, inside it or further down the page.
    let elements: Vec<ElementRef<'_>> = doc.root_element().descendent_elements().collect();

    let mut next_link: Vec<Option<&str>> = vec![None; elements.len()];
    let mut upcoming = None;
    for (i, el) in elements.iter().enumerate().rev() {
        next_link[i] = upcoming;
        if let Some(href) = publication_href(*el) {
            upcoming = Some(href);
        }
    }

    elements
        .iter()
        .zip(next_link)
        .filter(|(el, _)| matches!(el.value().name(), "div" | "p" | "span"))
        .filter_map(|(el, href)| {
            let href = href?;
            let title = text_of(*el);
            looks_like_title(&title).then(|| RawItem::new(href, title))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_iima_blocks() {
        let page = r#"<html><body>
          <div class="menu"><span>Quick Links and Online Payment</span></div>
          <div class="pub">
            <p>Credit Access and Firm Growth in Indian MSMEs</p>
            <a href="/publication/credit-access-firm-growth">Read More</a>
          </div>
          <div class="pub">
            <p>"Nudging Retail Investors": Evidence from SIP Flows</p>
            <a href="/publication/nudging-retail-investors">Read More</a>
          </div>
          <div class="pub">
            <p>working paper series volume listing</p>
            <a href="/publication/lowercase">Read More</a>
          </div>
          <a href="/publication/search?q=all">Search publications</a>
        </body></html>"#;
        let items = parse(&Html::parse_document(page));
        let got: Vec<(&str, &str)> = items.iter().map(|i| (i.href.as_str(), i.title.as_str())).collect();
        assert_eq!(
            got,
            vec![
                ("/publication/credit-access-firm-growth", "Credit Access and Firm Growth in Indian MSMEs"),
                ("/publication/nudging-retail-investors", "\"Nudging Retail Investors\": Evidence from SIP Flows"),
            ]
        );
    }

    #[test]
    fn test_block_without_following_link_is_skipped() {
        let page = r#"<html><body>
          <a href="/publication/earlier-paper">Read More</a>
          <p>Monetary Transmission Through Bank Lending Rates</p>
        </body></html>"#;
        assert!(parse(&Html::parse_document(page)).is_empty());
    }
}
