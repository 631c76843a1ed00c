use super::data::EventRecord;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of running OCR on one preprocessing variant.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrStrategyResult {
    pub strategy: String,
    pub text: String,
    /// Mean accepted-token confidence on a 0-100 scale.
    pub average_confidence: f32,
    pub accepted_tokens: usize,
}

impl OcrStrategyResult {
    /// The `("", 0.0)` result returned when nothing readable was found.
    pub fn empty(strategy: &str) -> Self {
        OcrStrategyResult {
            strategy: strategy.to_string(),
            text: String::new(),
            average_confidence: 0.0,
            accepted_tokens: 0,
        }
    }
}

/// Semantic label attached to a recognized entity span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    Date,
    Time,
    Location,
    Organization,
    Money,
    Other(String),
}

impl EntityLabel {
    /// Map a recognizer tag (`DATE`, `GPE`, `ORG`, ...) to a label.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "DATE" => EntityLabel::Date,
            "TIME" => EntityLabel::Time,
            "GPE" | "LOC" | "FAC" => EntityLabel::Location,
            "ORG" => EntityLabel::Organization,
            "MONEY" => EntityLabel::Money,
            other => EntityLabel::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
}

impl EntitySpan {
    pub fn new(text: &str, tag: &str) -> Self {
        EntitySpan {
            text: text.to_string(),
            label: EntityLabel::from_tag(tag),
        }
    }
}

/// Candidate values gathered for one analysis before fields are chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityEvidence {
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub locations: Vec<String>,
    pub organizations: Vec<String>,
    pub money: Vec<String>,
}

impl EntityEvidence {
    pub fn from_spans(spans: &[EntitySpan]) -> Self {
        let mut evidence = EntityEvidence::default();
        for span in spans {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            let bucket = match span.label {
                EntityLabel::Date => &mut evidence.dates,
                EntityLabel::Time => &mut evidence.times,
                EntityLabel::Location => &mut evidence.locations,
                EntityLabel::Organization => &mut evidence.organizations,
                EntityLabel::Money => &mut evidence.money,
                EntityLabel::Other(_) => continue,
            };
            push_unique(bucket, text);
        }
        evidence
    }

    pub fn len(&self) -> usize {
        self.dates.len()
            + self.times.len()
            + self.locations.len()
            + self.organizations.len()
            + self.money.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Push `value` unless an identical entry is already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Answers from the image-understanding capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageInsight {
    pub caption: String,
    pub title_answer: Option<String>,
    pub venue_answer: Option<String>,
    pub category_answer: Option<String>,
}

impl ImageInsight {
    pub fn is_empty(&self) -> bool {
        self.caption.trim().is_empty()
            && self.title_answer.is_none()
            && self.venue_answer.is_none()
            && self.category_answer.is_none()
    }
}

/// Envelope returned to the hosting process for every analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<EventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub debug_info: BTreeMap<String, Value>,
}

impl AnalysisResult {
    pub fn succeeded(record: EventRecord, debug_info: BTreeMap<String, Value>) -> Self {
        AnalysisResult {
            success: true,
            event_data: Some(record),
            error: None,
            debug_info,
        }
    }

    pub fn failed(message: &str, debug_info: BTreeMap<String, Value>) -> Self {
        AnalysisResult {
            success: false,
            event_data: None,
            error: Some(message.to_string()),
            debug_info,
        }
    }
}
