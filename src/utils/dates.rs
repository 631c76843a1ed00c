use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ORDINAL_SUFFIX: Regex = Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap();
    static ref WEEKDAY_PREFIX: Regex =
        Regex::new(r"(?i)^(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*,?\s+").unwrap();
}

// Day-first numeric forms are tried before month-first ones.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%d %b, %Y",
];

/// Normalize a free-form date string to `YYYY-MM-DD`.
///
/// Returns `None` when no known format matches, so callers can keep the
/// original text.
pub fn normalize_date(date_str: &str) -> Option<String> {
    let cleaned = date_str.trim().trim_end_matches(['.', ',']);
    let cleaned = WEEKDAY_PREFIX.replace(cleaned, "");
    let cleaned = ORDINAL_SUFFIX.replace_all(&cleaned, "$1");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            // %Y happily accepts two-digit years as the first century
            if date.year() < 1900 {
                continue;
            }
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_dates() {
        assert_eq!(normalize_date("15/05/2024").as_deref(), Some("2024-05-15"));
        assert_eq!(normalize_date("2024-05-15").as_deref(), Some("2024-05-15"));
        assert_eq!(normalize_date("05/15/2024").as_deref(), Some("2024-05-15"));
        assert_eq!(normalize_date("15-05-24").as_deref(), Some("2024-05-15"));
    }

    #[test]
    fn test_month_name_dates() {
        assert_eq!(normalize_date("May 15, 2024").as_deref(), Some("2024-05-15"));
        assert_eq!(normalize_date("15th March 2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("Friday, 3 Jan 2025").as_deref(), Some("2025-01-03"));
    }

    #[test]
    fn test_unrecognized_dates() {
        assert_eq!(normalize_date("next friday"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("32/13/2024"), None);
    }
}
