// Compiled regex tables shared by the field extractors.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref DATE_PATTERNS: Vec<Regex> = vec![
        // DD/MM/YYYY, MM-DD-YY
        Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b").unwrap(),
        // YYYY-MM-DD
        Regex::new(r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b").unwrap(),
        // May 15, 2024
        Regex::new(r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.? \d{1,2}(?:st|nd|rd|th)?,? \d{4}\b").unwrap(),
        // 15 May 2024
        Regex::new(r"(?i)\b\d{1,2}(?:st|nd|rd|th)? (?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,? \d{4}\b").unwrap(),
    ];

    // One alternation so "10:00 AM" is not reported again as "00 AM".
    // The AM/PM suffix is optional for H:MM times.
    pub static ref TIME_PATTERN: Regex =
        Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b|\b\d{1,2}:\d{2}\b").unwrap();

    pub static ref EMAIL_PATTERN: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();

    pub static ref PHONE_PATTERNS: Vec<Regex> = vec![
        // International / US format
        Regex::new(r"\+?\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3,4}[-.\s]?\d{4}").unwrap(),
        // Bangladeshi mobile
        Regex::new(r"\b01\d{9}\b").unwrap(),
    ];

    pub static ref VENUE_KEYWORD_LINE: Regex =
        Regex::new(r"(?i)^(?:venue|location|place|where|address|at)\b\s*[:\-]?\s*(.+)$").unwrap();

    // A following line that starts another labelled field is not an address.
    pub static ref FIELD_LABEL_LINE: Regex = Regex::new(
        r"(?i)^(?:date|time|contact|email|e-mail|phone|mobile|call|fee|entry|price|cost|register|registration|deadline)\b"
    )
    .unwrap();

    pub static ref FEE_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:fees?|price|cost|entry)\b[:\s]*(?:BDT|Tk\.?|৳|\$|USD)?\s*(\d+)").unwrap();

    pub static ref FREE_PATTERN: Regex = Regex::new(r"(?i)\bfree\b").unwrap();
}

/// All non-overlapping matches of `pattern`, in text order.
pub fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern.find_iter(text).map(|m| m.as_str().trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(text: &str) -> Vec<String> {
        DATE_PATTERNS.iter().flat_map(|p| find_all(p, text)).collect()
    }

    #[test]
    fn test_date_patterns() {
        assert_eq!(dates("Date: 15/05/2024"), vec!["15/05/2024"]);
        assert_eq!(dates("on 2024-05-15 only"), vec!["2024-05-15"]);
        assert_eq!(dates("May 15, 2024"), vec!["May 15, 2024"]);
        assert_eq!(dates("Held on 3rd January 2025"), vec!["3rd January 2025"]);
        assert!(dates("Room 301, call 5").is_empty());
    }

    #[test]
    fn test_time_pattern_policy() {
        assert_eq!(find_all(&TIME_PATTERN, "Time: 10:00 AM"), vec!["10:00 AM"]);
        assert_eq!(find_all(&TIME_PATTERN, "from 3 pm to 17:30"), vec!["3 pm", "17:30"]);
        assert!(find_all(&TIME_PATTERN, "Date: 15/05/2024").is_empty());
    }

    #[test]
    fn test_contact_patterns() {
        assert_eq!(
            find_all(&EMAIL_PATTERN, "Mail club.events@bracu.ac.bd now"),
            vec!["club.events@bracu.ac.bd"]
        );
        assert_eq!(find_all(&PHONE_PATTERNS[0], "Call +1 (555) 123-4567"), vec!["+1 (555) 123-4567"]);
        assert_eq!(find_all(&PHONE_PATTERNS[1], "Hotline 01712345678"), vec!["01712345678"]);
    }

    #[test]
    fn test_venue_and_fee_patterns() {
        let caps = VENUE_KEYWORD_LINE.captures("Venue: TSC Auditorium").unwrap();
        assert_eq!(&caps[1], "TSC Auditorium");
        let caps = VENUE_KEYWORD_LINE.captures("at Central Library").unwrap();
        assert_eq!(&caps[1], "Central Library");
        assert!(VENUE_KEYWORD_LINE.captures("Attend the talk").is_none());

        let caps = FEE_PATTERN.captures("Entry Fee: BDT 200").unwrap();
        assert_eq!(&caps[1], "200");
        assert_eq!(&FEE_PATTERN.captures("Fees: USD 15").unwrap()[1], "15");
        assert!(FEE_PATTERN.captures("Free coffee 2 cups").is_none());
        assert!(FEE_PATTERN.captures("Pricey snacks 40").is_none());
        assert!(FREE_PATTERN.is_match("Entry is FREE for all"));
        assert!(!FREE_PATTERN.is_match("freedom fighters"));
    }
}
