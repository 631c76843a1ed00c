use crate::models::{push_unique, EventRecord, ExtractionTables};
use crate::processing::confidence::ConfidenceFusion;
use crate::processing::extractors::describe_schedule;
use crate::utils::{normalize_date, BannerError, Result};
use log::debug;
use serde_json::{Map, Value};

const RECORD_KEYS: &[&str] = &[
    "title",
    "description",
    "category",
    "venue_name",
    "venue_address",
    "contact_email",
    "contact_phone",
    "entry_fee",
    "tags",
];

const DATE_KEYS: &[&str] = &["date", "event_date"];
const TIME_KEYS: &[&str] = &["time", "event_time"];

/// Turns a chat model's JSON answer into a normalized `EventRecord`.
pub struct StructuredValidator;

impl StructuredValidator {
    pub fn validate(raw: &str, tables: &ExtractionTables) -> Result<EventRecord> {
        let object = Self::parse_object(raw)?;

        let known = RECORD_KEYS
            .iter()
            .chain(DATE_KEYS)
            .chain(TIME_KEYS)
            .any(|key| object.contains_key(*key));
        if !known {
            return Err(BannerError::MalformedStructuredOutput(
                "JSON object carries no event fields".to_string(),
            ));
        }

        let mut record = EventRecord {
            title: string_field(&object, "title"),
            description: string_field(&object, "description"),
            venue_name: string_field(&object, "venue_name"),
            venue_address: string_field(&object, "venue_address"),
            contact_email: string_field(&object, "contact_email"),
            contact_phone: string_field(&object, "contact_phone"),
            ..Default::default()
        };

        // Step 1: category must be one of the known names
        let category = string_field(&object, "category");
        record.category = tables.known_category(&category).unwrap_or_default().to_string();
        if record.category.is_empty() && !category.is_empty() {
            debug!("Dropping unknown category '{}'", category);
        }

        // Step 2: fee
        let fee = string_field(&object, "entry_fee");
        record.entry_fee = if fee.eq_ignore_ascii_case("free") {
            "0".to_string()
        } else {
            fee
        };

        // Step 3: tags, scalar or list
        record.tags = tag_list(object.get("tags"));

        // Step 4: loose date/time keys go into the description unless it
        // already mentions them
        let description = &record.description;
        let dates: Vec<String> = first_present(&object, DATE_KEYS)
            .filter(|date| !description.contains(date.as_str()))
            .map(|date| normalize_date(&date).unwrap_or(date))
            .filter(|date| !description.contains(date.as_str()))
            .into_iter()
            .collect();
        let times: Vec<String> = first_present(&object, TIME_KEYS)
            .filter(|time| !description.contains(time.as_str()))
            .into_iter()
            .collect();
        let schedule = describe_schedule(&dates, &times);
        if !schedule.is_empty() {
            record.description = if record.description.is_empty() {
                schedule
            } else {
                format!("{} | {}", record.description, schedule)
            };
        }

        ConfidenceFusion::from_completeness(&mut record);
        Ok(record)
    }

    fn parse_object(raw: &str) -> Result<Map<String, Value>> {
        let body = strip_code_fences(raw);

        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(first_error) => {
                // Models sometimes wrap the object in prose
                let start = body.find('{');
                let end = body.rfind('}');
                match (start, end) {
                    (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])
                        .map_err(|e| BannerError::MalformedStructuredOutput(format!("Invalid JSON: {}", e)))?,
                    _ => {
                        return Err(BannerError::MalformedStructuredOutput(format!(
                            "Invalid JSON: {}",
                            first_error
                        )))
                    }
                }
            }
        };

        match value {
            Value::Object(object) => Ok(object),
            other => Err(BannerError::MalformedStructuredOutput(format!(
                "Expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).map(scalar_text).unwrap_or_default()
}

fn first_present(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .map(|key| string_field(object, key))
        .find(|value| !value.is_empty())
}

fn tag_list(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(scalar) => vec![scalar_text(scalar)],
    };

    let mut tags = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() {
            push_unique(&mut tags, &tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Confidence;

    fn validate(raw: &str) -> Result<EventRecord> {
        StructuredValidator::validate(raw, &ExtractionTables::default())
    }

    #[test]
    fn test_full_answer() {
        let raw = r#"{
            "title": "Python Workshop 2024",
            "description": "Hands-on intro",
            "category": "Workshop",
            "venue_name": "Virtual Meeting Room",
            "venue_address": "",
            "contact_email": "test@example.com",
            "contact_phone": null,
            "entry_fee": 0,
            "tags": ["Online", "workshop", "online"]
        }"#;
        let record = validate(raw).unwrap();

        assert_eq!(record.category, "workshop");
        assert_eq!(record.contact_phone, "");
        assert_eq!(record.entry_fee, "0");
        assert_eq!(record.tags, vec!["online", "workshop"]);
        // 7 of 9 fields filled
        assert_eq!(record.confidence, Confidence::High);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record = validate(r#"{"title": "Robotics Meetup"}"#).unwrap();
        assert_eq!(record.title, "Robotics Meetup");
        assert_eq!(record.description, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.confidence, Confidence::Low);
    }

    #[test]
    fn test_scalar_tags_become_list() {
        let record = validate(r#"{"title": "x", "tags": "Networking"}"#).unwrap();
        assert_eq!(record.tags, vec!["networking"]);
    }

    #[test]
    fn test_unknown_category_and_free_fee() {
        let record = validate(r#"{"category": "party", "entry_fee": "Free"}"#).unwrap();
        assert_eq!(record.category, "");
        assert_eq!(record.entry_fee, "0");
    }

    #[test]
    fn test_date_keys_fill_description() {
        let record = validate(r#"{"title": "Fest", "date": "May 15, 2024", "time": "10:00 AM"}"#).unwrap();
        assert_eq!(record.description, "Date: 2024-05-15 | Time: 10:00 AM");

        let record = validate(r#"{"title": "Fest", "event_date": "sometime soon"}"#).unwrap();
        assert_eq!(record.description, "Date: sometime soon");

        let record = validate(r#"{"description": "Annual fest", "date": "May 15, 2024"}"#).unwrap();
        assert_eq!(record.description, "Annual fest | Date: 2024-05-15");

        let record = validate(r#"{"description": "Fest on May 15, 2024 at 5 PM", "date": "May 15, 2024", "time": "5 PM"}"#)
            .unwrap();
        assert_eq!(record.description, "Fest on May 15, 2024 at 5 PM");

        let record = validate(r#"{"description": "Fest, Date: 2024-05-15", "date": "15/05/2024"}"#).unwrap();
        assert_eq!(record.description, "Fest, Date: 2024-05-15");
    }

    #[test]
    fn test_code_fences_and_prose() {
        let fenced = "```json\n{\"title\": \"Gala\"}\n```";
        assert_eq!(validate(fenced).unwrap().title, "Gala");

        let chatty = "Sure! Here it is: {\"title\": \"Gala\"} Hope that helps.";
        assert_eq!(validate(chatty).unwrap().title, "Gala");
    }

    #[test]
    fn test_malformed_answers() {
        for raw in ["not json at all", "[1, 2, 3]", "\"title\"", "{\"foo\": 1}", ""] {
            let err = validate(raw).unwrap_err();
            assert_eq!(err.kind(), "malformed_structured_output", "input {:?}", raw);
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
