use crate::backends::Backends;
use crate::config::AnalyzerConfig;
use crate::models::{AnalysisResult, EntityEvidence, EventRecord, ImageInsight, OcrStrategyResult};
use crate::processing::confidence::ConfidenceFusion;
use crate::processing::extractors::FieldExtractor;
use crate::processing::llm::{LlmOutcome, LlmStructurer};
use crate::processing::{ImageInput, ImageProcessor, StrategySelector, TextCleaner};
use crate::utils::{BannerError, Result};
use image::DynamicImage;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;

const RAW_TEXT_DEBUG_LIMIT: usize = 1000;

const TITLE_QUESTION: &str = "What is the title of this event?";
const VENUE_QUESTION: &str = "Where is this event taking place?";
const CATEGORY_QUESTION: &str = "What type of event is this?";

/// Pipeline orchestrator: OCR once, then LLM structuring with a heuristic
/// fallback.
pub struct BannerAnalyzer {
    backends: Backends,
    config: AnalyzerConfig,
    heuristic_only: bool,
}

impl BannerAnalyzer {
    pub fn new(backends: Backends, config: AnalyzerConfig) -> Self {
        BannerAnalyzer {
            backends,
            config,
            heuristic_only: false,
        }
    }

    pub fn from_config(config: AnalyzerConfig) -> Result<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::new(backends, config))
    }

    /// Skip the LLM path entirely.
    pub fn heuristic_only(mut self, enabled: bool) -> Self {
        self.heuristic_only = enabled;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one banner. Never fails: backend errors turn into fallbacks,
    /// and only a run where no path found usable text reports `success=false`.
    pub fn analyze(&self, input: &ImageInput) -> AnalysisResult {
        let started = Instant::now();
        let mut debug_info: BTreeMap<String, Value> = BTreeMap::new();

        // Step 1: Decode the image
        let image = match ImageProcessor::load(input) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("{}", e);
                debug_info.insert("decode_error".to_string(), json!(e.to_string()));
                None
            }
        };

        // Step 2: OCR once, shared by both paths
        let selector = StrategySelector::new(self.backends.ocr.as_ref(), &self.config.ocr);
        let ocr = match &image {
            Some(image) => selector.select_from_image(image),
            None => OcrStrategyResult::empty("none"),
        };
        let text = TextCleaner::clean(&ocr.text);
        self.record_ocr(&mut debug_info, &ocr, &text);

        // Step 3: LLM structuring
        match self.try_llm(&text) {
            Ok(outcome) => {
                info!("LLM structuring succeeded with {}", outcome.model);
                debug_info.insert("method".to_string(), json!("llm_hybrid"));
                debug_info.insert("llm_model".to_string(), json!(outcome.model));
                Self::record_elapsed(&mut debug_info, started);
                return AnalysisResult::succeeded(outcome.record, debug_info);
            }
            Err(e) => {
                warn!("LLM path unavailable, using heuristics: {}", e);
                debug_info.insert("llm_fallback_reason".to_string(), json!(format!("{}: {}", e.kind(), e)));
            }
        }

        // Step 4: Heuristic extraction
        debug_info.insert("method".to_string(), json!("heuristic"));
        let outcome = self.try_heuristic(image.as_ref(), &text, ocr.average_confidence, &mut debug_info);
        Self::record_elapsed(&mut debug_info, started);

        match outcome {
            Ok(record) => AnalysisResult::succeeded(record, debug_info),
            Err(e) => {
                warn!("Analysis failed: {}", e);
                AnalysisResult::failed(&format!("No usable text found in image ({})", e), debug_info)
            }
        }
    }

    fn try_llm(&self, text: &str) -> Result<LlmOutcome> {
        if self.heuristic_only || !self.config.llm.enabled {
            return Err(BannerError::BackendUnavailable("LLM structuring disabled".to_string()));
        }
        let chat = self
            .backends
            .chat
            .as_deref()
            .ok_or_else(|| BannerError::BackendUnavailable("No chat backend configured".to_string()))?;

        LlmStructurer::new(chat, &self.config.llm, &self.config.extraction).structure(text)
    }

    fn try_heuristic(
        &self,
        image: Option<&DynamicImage>,
        text: &str,
        ocr_confidence: f32,
        debug_info: &mut BTreeMap<String, Value>,
    ) -> Result<EventRecord> {
        let evidence = self.recognize_entities(text);
        debug_info.insert("entities_found".to_string(), json!(evidence.len()));

        let insight = image.and_then(|image| self.describe_image(image));
        debug_info.insert("image_insight".to_string(), json!(insight));

        if text.is_empty() && insight.is_none() {
            return Err(BannerError::InsufficientSignal(
                "OCR found no text and no image description is available".to_string(),
            ));
        }

        let extractor = FieldExtractor::new(&self.config.extraction);
        let mut record = extractor.extract(text, &evidence, insight.as_ref());
        ConfidenceFusion::fuse(&mut record, ocr_confidence);
        Ok(record)
    }

    fn recognize_entities(&self, text: &str) -> EntityEvidence {
        let Some(recognizer) = self.backends.entities.as_deref() else {
            return EntityEvidence::default();
        };
        if text.is_empty() {
            return EntityEvidence::default();
        }
        match recognizer.recognize(text) {
            Ok(spans) => {
                debug!("Entity recognizer returned {} spans", spans.len());
                EntityEvidence::from_spans(&spans)
            }
            Err(e) => {
                warn!("Entity recognition failed, using patterns only: {}", e);
                EntityEvidence::default()
            }
        }
    }

    fn describe_image(&self, image: &DynamicImage) -> Option<ImageInsight> {
        let vision = self.backends.vision.as_deref()?;

        let caption = vision.caption(image).unwrap_or_else(|e| {
            warn!("Captioning failed: {}", e);
            String::new()
        });
        let ask = |question: &str| match vision.answer(image, question) {
            Ok(answer) if !answer.trim().is_empty() => Some(answer.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("Image question '{}' failed: {}", question, e);
                None
            }
        };

        let insight = ImageInsight {
            caption: caption.trim().to_string(),
            title_answer: ask(TITLE_QUESTION),
            venue_answer: ask(VENUE_QUESTION),
            category_answer: ask(CATEGORY_QUESTION),
        };
        (!insight.is_empty()).then_some(insight)
    }

    fn record_ocr(&self, debug_info: &mut BTreeMap<String, Value>, ocr: &OcrStrategyResult, text: &str) {
        let raw: String = ocr.text.chars().take(RAW_TEXT_DEBUG_LIMIT).collect();
        debug_info.insert("ocr_backend".to_string(), json!(self.backends.ocr.name()));
        debug_info.insert("ocr_strategy".to_string(), json!(ocr.strategy));
        debug_info.insert("ocr_confidence".to_string(), json!(ocr.average_confidence));
        debug_info.insert("ocr_length".to_string(), json!(text.chars().count()));
        debug_info.insert("raw_ocr_text".to_string(), json!(raw));
    }

    fn record_elapsed(debug_info: &mut BTreeMap<String, Value>, started: Instant) {
        debug_info.insert("elapsed_ms".to_string(), json!(started.elapsed().as_millis() as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{
        BoundingBox, ChatBackend, EntityRecognizer, ImageUnderstanding, ModelDescriptor, OcrBackend, OcrParams,
        OcrToken,
    };
    use crate::models::{Confidence, EntitySpan};
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BANNER: &str =
        "Python Workshop 2024\nDate: 15/05/2024\nTime: 10:00 AM\nVenue: Virtual Meeting Room\nContact: test@example.com";

    /// Returns one token per line of `text`, for every variant.
    struct ScriptedOcr {
        text: &'static str,
    }

    impl OcrBackend for ScriptedOcr {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(&self, _image: &GrayImage, _params: &OcrParams) -> Result<Vec<OcrToken>> {
            Ok(self
                .text
                .lines()
                .enumerate()
                .map(|(i, line)| OcrToken {
                    bbox: BoundingBox {
                        left: 10,
                        top: i as u32 * 40,
                        width: 200,
                        height: 20,
                    },
                    text: line.to_string(),
                    confidence: 0.9,
                })
                .collect())
        }
    }

    struct ScriptedChat {
        models: Vec<&'static str>,
        answer: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl ChatBackend for ScriptedChat {
        fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
            Ok(self.models.iter().map(|name| ModelDescriptor::new(name)).collect())
        }

        fn complete(&self, _model: &str, _prompt: &str, _require_json: bool) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_string())
        }
    }

    struct ScriptedEntities;

    impl EntityRecognizer for ScriptedEntities {
        fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
            Ok(vec![EntitySpan::new("BDT 300", "MONEY")])
        }
    }

    struct ScriptedVision;

    impl ImageUnderstanding for ScriptedVision {
        fn caption(&self, _image: &DynamicImage) -> Result<String> {
            Ok("a poster for a robotics hackathon".to_string())
        }

        fn answer(&self, _image: &DynamicImage, question: &str) -> Result<String> {
            if question == VENUE_QUESTION {
                Err(BannerError::BackendUnavailable("timeout".to_string()))
            } else {
                Ok(String::new())
            }
        }
    }

    fn config() -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        config.ocr.advanced_preprocessing = false;
        config
    }

    fn image() -> ImageInput {
        ImageInput::from(DynamicImage::new_luma8(64, 32))
    }

    fn chat(models: Vec<&'static str>, answer: &'static str) -> (Box<ScriptedChat>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let chat = ScriptedChat {
            models,
            answer,
            calls: Arc::clone(&calls),
        };
        (Box::new(chat), calls)
    }

    #[test]
    fn test_llm_path_wins_when_answer_is_valid() {
        let (chat, calls) = chat(vec!["llama3"], r#"{"title": "Python Workshop 2024", "category": "workshop"}"#);
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER })).with_chat(chat);
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.debug_info["method"], "llm_hybrid");
        assert_eq!(result.debug_info["llm_model"], "llama3");
        assert_eq!(result.debug_info["ocr_backend"], "scripted");
        let record = result.event_data.unwrap();
        assert_eq!(record.category, "workshop");
    }

    #[test]
    fn test_analyzer_is_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BannerAnalyzer>();

        let (chat, calls) = chat(vec!["llama3"], r#"{"title": "Python Workshop 2024"}"#);
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER })).with_chat(chat);
        let analyzer = Arc::new(BannerAnalyzer::new(backends, config()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let analyzer = Arc::clone(&analyzer);
                std::thread::spawn(move || analyzer.analyze(&image()))
            })
            .collect();
        for worker in workers {
            let result = worker.join().unwrap();
            assert!(result.success);
            assert_eq!(result.event_data.unwrap().title, "Python Workshop 2024");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_bad_json_falls_back_to_heuristics() {
        let (chat, calls) = chat(vec!["mistral"], "Sorry, I cannot help with that.");
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER })).with_chat(chat);
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.debug_info["method"], "heuristic");
        let reason = result.debug_info["llm_fallback_reason"].as_str().unwrap();
        assert!(reason.starts_with("malformed_structured_output"));

        let record = result.event_data.unwrap();
        assert_eq!(record.title, "Python Workshop 2024");
        assert_eq!(record.contact_email, "test@example.com");
        assert_eq!(record.venue_name, "Virtual Meeting Room");
        assert!(record.description.contains("Date: 15/05/2024"));
        assert!(record.description.contains("Time: 10:00 AM"));
        assert_eq!(record.confidence, Confidence::High);
    }

    #[test]
    fn test_no_models_falls_back() {
        let (chat, calls) = chat(vec![], "{}");
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER })).with_chat(chat);
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let reason = result.debug_info["llm_fallback_reason"].as_str().unwrap();
        assert!(reason.starts_with("backend_unavailable"));
    }

    #[test]
    fn test_heuristic_only_never_calls_chat() {
        let (chat, calls) = chat(vec!["llama3"], r#"{"title": "From the model"}"#);
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER })).with_chat(chat);
        let result = BannerAnalyzer::new(backends, config())
            .heuristic_only(true)
            .analyze(&image());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.event_data.unwrap().title, "Python Workshop 2024");
    }

    #[test]
    fn test_entities_feed_heuristics() {
        let backends =
            Backends::new(Box::new(ScriptedOcr { text: "Spring Gala\nFee: 500" })).with_entities(Box::new(ScriptedEntities));
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert_eq!(result.debug_info["entities_found"], 1);
        assert_eq!(result.event_data.unwrap().entry_fee, "BDT 300");
    }

    #[test]
    fn test_empty_text_without_insight_fails() {
        let (chat, calls) = chat(vec!["llama3"], "{}");
        let backends = Backends::new(Box::new(ScriptedOcr { text: "" })).with_chat(chat);
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert!(!result.success);
        assert!(result.event_data.is_none());
        assert!(!result.error.unwrap_or_default().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.debug_info.contains_key("elapsed_ms"));
    }

    #[test]
    fn test_undecodable_image_fails_cleanly() {
        let backends = Backends::new(Box::new(ScriptedOcr { text: BANNER }));
        let result = BannerAnalyzer::new(backends, config()).analyze(&ImageInput::Bytes(vec![1, 2, 3]));

        assert!(!result.success);
        assert!(result.debug_info.contains_key("decode_error"));
    }

    #[test]
    fn test_caption_rescues_empty_text() {
        let backends = Backends::new(Box::new(ScriptedOcr { text: "" })).with_vision(Box::new(ScriptedVision));
        let result = BannerAnalyzer::new(backends, config()).analyze(&image());

        assert!(result.success);
        let record = result.event_data.unwrap();
        assert_eq!(record.title, "a poster for a robotics hackathon");
        assert_eq!(record.category, "");
        assert_eq!(record.confidence, Confidence::Low);
    }
}
