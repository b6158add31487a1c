//! Text cleanup for titles, abstracts and author strings.

use scraper::Html;

/// Abstracts longer than this are cut at a character boundary.
pub const MAX_ABSTRACT_CHARS: usize = 5000;

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop markup and decode entities, keeping only the text content.
pub fn strip_html(s: &str) -> String {
    if !s.contains('<') && !s.contains('&') {
        return clean_text(s);
    }
    let fragment = Html::parse_fragment(s);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    clean_text(&text)
}

/// Normalise an abstract: strip markup, collapse whitespace, truncate.
/// Blank input becomes `None`.
pub fn clean_abstract(raw: Option<&str>) -> Option<String> {
    let text = strip_html(raw?);
    if text.is_empty() {
        return None;
    }
    match text.char_indices().nth(MAX_ABSTRACT_CHARS) {
        Some((cut, _)) => Some(text[..cut].trim_end().to_string()),
        None => Some(text),
    }
}

/// Split a single author string into names, preserving order.
/// Separators are `;`, `,` and ` and `.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(';')
        .flat_map(|part| part.split(" and "))
        .flat_map(|part| part.split(','))
        .map(clean_text)
        .filter(|name| !name.is_empty())
        .collect()
}
