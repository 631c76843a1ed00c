use lazy_static::lazy_static;
use regex::Regex;

// Characters OCR engines emit for specks and decorative borders.
const NOISE_SYMBOLS: &str = "|_-=~*#.,:;'\"`!^°•·+<>/\\()[]{}@&%$";

lazy_static! {
    static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r"\s+([,.])").unwrap();
    static ref REPEATED_COMMA: Regex = Regex::new(r",{2,}").unwrap();
    static ref COMMA_BEFORE_PERIOD: Regex = Regex::new(r",\.").unwrap();
    static ref COMMA_BEFORE_WORD: Regex = Regex::new(r",([A-Za-z])").unwrap();
}

/// Normalizes raw OCR output before field extraction.
pub struct TextCleaner;

impl TextCleaner {
    /// Clean line by line; line order is preserved and dropped lines vanish.
    pub fn clean(raw: &str) -> String {
        raw.lines()
            .filter_map(Self::clean_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn clean_line(line: &str) -> Option<String> {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.chars().count() < 2 || Self::is_noise(&collapsed) {
            return None;
        }

        Some(Self::repair_punctuation(&collapsed))
    }

    fn is_noise(line: &str) -> bool {
        !line.chars().any(char::is_alphanumeric)
            && line.chars().all(|c| c == ' ' || NOISE_SYMBOLS.contains(c))
    }

    fn repair_punctuation(line: &str) -> String {
        let repaired = SPACE_BEFORE_PUNCT.replace_all(line, "$1");
        let repaired = REPEATED_COMMA.replace_all(&repaired, ",");
        let repaired = COMMA_BEFORE_PERIOD.replace_all(&repaired, ".");
        let repaired = COMMA_BEFORE_WORD.replace_all(&repaired, ", $1");
        repaired.trim().to_string()
    }
}
