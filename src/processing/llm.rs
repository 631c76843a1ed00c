// LLM-assisted structuring: OCR text in, validated EventRecord out.

use crate::backends::models::select_model;
use crate::backends::ChatBackend;
use crate::config::LlmConfig;
use crate::models::{EventRecord, ExtractionTables};
use crate::utils::{BannerError, Result};
use crate::validation::StructuredValidator;
use log::{debug, info};

const PROMPT_TEMPLATE: &str = r#"You extract event details from text read off an event banner.
Respond with ONLY a JSON object, no commentary, using exactly these keys:
{
  "title": "event title",
  "description": "short description including date and time",
  "category": "one of: {categories}",
  "venue_name": "venue name",
  "venue_address": "venue address",
  "contact_email": "email address",
  "contact_phone": "phone number",
  "entry_fee": "fee as a number, 0 if free",
  "tags": ["keyword", "keyword"],
  "date": "event date",
  "time": "event time"
}
Use an empty string for anything the text does not state. Do not invent details.

Banner text:
{text}"#;

/// Result of a successful structuring round trip.
#[derive(Debug, Clone)]
pub struct LlmOutcome {
    pub model: String,
    pub record: EventRecord,
}

pub struct LlmStructurer<'a> {
    chat: &'a dyn ChatBackend,
    config: &'a LlmConfig,
    tables: &'a ExtractionTables,
}

impl<'a> LlmStructurer<'a> {
    pub fn new(chat: &'a dyn ChatBackend, config: &'a LlmConfig, tables: &'a ExtractionTables) -> Self {
        LlmStructurer { chat, config, tables }
    }

    pub fn build_prompt(&self, text: &str) -> String {
        let categories = self.tables.category_names().collect::<Vec<_>>().join(", ");
        PROMPT_TEMPLATE
            .replace("{categories}", &categories)
            .replace("{text}", text.trim())
    }

    /// Pick a model from what the backend reports, by configured preference.
    pub fn choose_model(&self) -> Result<String> {
        let models = self.chat.list_models()?;
        select_model(&models, &self.config.model_preference)
            .map(|m| m.name.clone())
            .ok_or_else(|| BannerError::BackendUnavailable("No chat models available".to_string()))
    }

    /// One structuring attempt. Short text is rejected before any backend call.
    pub fn structure(&self, text: &str) -> Result<LlmOutcome> {
        let length = text.trim().chars().count();
        if length < self.config.min_text_len {
            return Err(BannerError::InsufficientSignal(format!(
                "OCR text has {} characters, need at least {}",
                length, self.config.min_text_len
            )));
        }

        let model = self.choose_model()?;
        info!("Structuring OCR text with model {}", model);

        let prompt = self.build_prompt(text);
        let answer = self.chat.complete(&model, &prompt, true)?;
        debug!("Chat answer: {} chars", answer.len());

        let record = StructuredValidator::validate(&answer, self.tables)?;
        Ok(LlmOutcome { model, record })
    }
}
