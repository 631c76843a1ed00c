use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-tier extraction confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured event metadata extracted from a banner.
///
/// All fields are always present; unknown values are empty strings or an
/// empty tag list. `confidence` starts at `medium` until fusion runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    pub venue_name: String,
    pub venue_address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub entry_fee: String,
    pub tags: Vec<String>,
    pub confidence: Confidence,
}

impl EventRecord {
    /// Number of fields that take part in completeness scoring.
    pub const SCORED_FIELDS: usize = 9;

    /// Count of scored fields carrying a value.
    pub fn filled_fields(&self) -> usize {
        let text_fields = [
            &self.title,
            &self.description,
            &self.category,
            &self.venue_name,
            &self.venue_address,
            &self.contact_email,
            &self.contact_phone,
            &self.entry_fee,
        ];
        let filled = text_fields.iter().filter(|v| !v.trim().is_empty()).count();
        filled + usize::from(!self.tags.is_empty())
    }

    /// Append a tag unless it is empty or already present.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_serializes_every_key() {
        let record = EventRecord::default();
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 10);
        for key in [
            "title",
            "description",
            "category",
            "venue_name",
            "venue_address",
            "contact_email",
            "contact_phone",
            "entry_fee",
            "tags",
            "confidence",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(object["confidence"], "medium");
        assert_eq!(object["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_round_trip_keeps_empty_fields() {
        let record = EventRecord {
            title: "Robotics Meetup".to_string(),
            confidence: Confidence::Low,
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_add_tag_rejects_duplicates() {
        let mut record = EventRecord::default();
        record.add_tag("workshop");
        record.add_tag("online");
        record.add_tag("workshop");
        record.add_tag("  ");
        assert_eq!(record.tags, vec!["workshop", "online"]);
        assert_eq!(record.filled_fields(), 1);
    }
}
