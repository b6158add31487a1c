//! Publication date parsing.
//!
//! Sources publish dates in many shapes. Full dates map to themselves,
//! month-year forms to the first of the month and bare years to
//! 1 January.

use chrono::{DateTime, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

const DAY_FORMATS: &[&str] = &[
    "%b %d, %Y", // Dec 31, 2024
    "%B %d, %Y", // December 31, 2024
    "%Y-%m-%d",  // 2024-12-31
    "%d/%m/%Y",  // 31/12/2024
    "%d-%m-%Y",  // 31-12-2024
    "%d %b %Y",  // 31 Dec 2024
    "%d %B %Y",  // 31 December 2024
];

const MONTH_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y"];

lazy_static! {
    static ref MONTH_NUMERIC: Regex = Regex::new(r"^(\d{1,2})/(\d{4})$").unwrap();
    static ref BARE_YEAR: Regex = Regex::new(r"^(\d{4})$").unwrap();
    static ref DAY_MONTH_YEAR: Regex =
        Regex::new(r"\b(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{4})\b").unwrap();
}

/// Parse a date string in any of the supported shapes.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    // December 2024, Dec 2024
    let first_of_month = format!("1 {}", s);
    for fmt in MONTH_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&first_of_month, fmt) {
            return Some(d);
        }
    }

    if let Some(caps) = MONTH_NUMERIC.captures(s) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    if let Some(caps) = BARE_YEAR.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    // Feed timestamps without an offset, e.g. 2024-03-05T10:00:00
    s.get(..10).and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Find the first "13 Jan 2026"-style date inside free text.
pub fn find_date_in_text(text: &str) -> Option<NaiveDate> {
    DAY_MONTH_YEAR
        .captures_iter(text)
        .filter_map(|caps| parse_date(&caps[1].replace('.', "")))
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_full_date_formats() {
        assert_eq!(parse_date("Dec 31, 2024"), ymd(2024, 12, 31));
        assert_eq!(parse_date("December 31, 2024"), ymd(2024, 12, 31));
        assert_eq!(parse_date("2024-12-31"), ymd(2024, 12, 31));
        assert_eq!(parse_date("31/12/2024"), ymd(2024, 12, 31));
        assert_eq!(parse_date("31-12-2024"), ymd(2024, 12, 31));
        assert_eq!(parse_date(" 5 Mar 2025 "), ymd(2025, 3, 5));
        assert_eq!(parse_date("5 March 2025"), ymd(2025, 3, 5));
    }

    #[test]
    fn test_feed_timestamps() {
        assert_eq!(parse_date("Tue, 05 Mar 2024 10:00:00 +0000"), ymd(2024, 3, 5));
        assert_eq!(parse_date("2024-03-05T23:30:00+05:30"), ymd(2024, 3, 5));
        assert_eq!(parse_date("2024-03-05T10:00:00"), ymd(2024, 3, 5));
    }

    #[test]
    fn test_partial_dates_map_to_period_start() {
        assert_eq!(parse_date("December 2024"), ymd(2024, 12, 1));
        assert_eq!(parse_date("Dec 2024"), ymd(2024, 12, 1));
        assert_eq!(parse_date("12/2025"), ymd(2025, 12, 1));
        assert_eq!(parse_date("2023"), ymd(2023, 1, 1));
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("forthcoming"), None);
        assert_eq!(parse_date("13/2025"), None);
    }

    #[test]
    fn test_find_date_in_text() {
        assert_eq!(
            find_date_in_text("Working Paper\nBy Ajay Shah\n13 Jan 2026\nRead more"),
            ymd(2026, 1, 13)
        );
        assert_eq!(find_date_in_text("no date here"), None);
    }
}
