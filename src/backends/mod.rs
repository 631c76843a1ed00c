// Capability seams for the external OCR, entity, vision and chat engines.
// The pipeline only talks to these traits, so tests can swap in fakes.

pub mod models;
pub mod ollama;
pub mod tesseract_ocr;

pub use models::ModelDescriptor;
pub use ollama::OllamaClient;
pub use tesseract_ocr::TesseractOcr;

use crate::config::AnalyzerConfig;
use crate::models::EntitySpan;
use crate::utils::Result;
use image::{DynamicImage, GrayImage};
use log::info;

/// Pixel-space box of one recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn center_y(&self) -> f32 {
        self.top as f32 + self.height as f32 / 2.0
    }
}

/// One recognized piece of text with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

/// Bounds handed to the OCR engine for every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrParams {
    /// Minimum text-box height in pixels.
    pub min_size: u32,
    /// Minimum confidence for a token to be reported at all.
    pub text_threshold: f32,
    /// Images larger than this on either side are shrunk before recognition.
    pub canvas_size: u32,
}

impl Default for OcrParams {
    fn default() -> Self {
        OcrParams {
            min_size: 8,
            text_threshold: 0.1,
            canvas_size: 2560,
        }
    }
}

pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize text on a preprocessed bitmap.
    fn recognize(&self, image: &GrayImage, params: &OcrParams) -> Result<Vec<OcrToken>>;
}

pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

pub trait ImageUnderstanding: Send + Sync {
    fn caption(&self, image: &DynamicImage) -> Result<String>;

    fn answer(&self, image: &DynamicImage, question: &str) -> Result<String>;
}

pub trait ChatBackend: Send + Sync {
    fn list_models(&self) -> Result<Vec<ModelDescriptor>>;

    /// Send one prompt; `require_json` asks the model for a bare JSON answer.
    fn complete(&self, model: &str, prompt: &str, require_json: bool) -> Result<String>;
}

/// Backend handles owned for the lifetime of the process.
pub struct Backends {
    pub ocr: Box<dyn OcrBackend>,
    pub entities: Option<Box<dyn EntityRecognizer>>,
    pub vision: Option<Box<dyn ImageUnderstanding>>,
    pub chat: Option<Box<dyn ChatBackend>>,
}

impl Backends {
    pub fn new(ocr: Box<dyn OcrBackend>) -> Self {
        Backends {
            ocr,
            entities: None,
            vision: None,
            chat: None,
        }
    }

    pub fn with_entities(mut self, entities: Box<dyn EntityRecognizer>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_vision(mut self, vision: Box<dyn ImageUnderstanding>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_chat(mut self, chat: Box<dyn ChatBackend>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Build the default stack: Tesseract for OCR, Ollama for chat and vision.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let ocr = TesseractOcr::new(config.ocr.datapath.clone(), &config.ocr.language);
        let mut backends = Backends::new(Box::new(ocr));

        if config.llm.enabled {
            info!("Chat backend enabled at {}", config.llm.base_url);
            backends = backends.with_chat(Box::new(OllamaClient::new(&config.llm)?));
        }
        if let Some(vision_model) = &config.llm.vision_model {
            info!("Image understanding enabled with model {}", vision_model);
            let client = OllamaClient::new(&config.llm)?.with_vision_model(vision_model);
            backends = backends.with_vision(Box::new(client));
        }
        Ok(backends)
    }
}
