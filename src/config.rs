use crate::models::ExtractionTables;
use crate::utils::{BannerError, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
    pub extraction: ExtractionTables,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    pub datapath: Option<String>,
    /// Tokens at or below this confidence (0-1) are discarded.
    pub acceptance_threshold: f32,
    /// Long-side cap applied before any preprocessing.
    pub max_dimension: u32,
    pub min_size: u32,
    pub text_threshold: f32,
    pub canvas_size: u32,
    pub advanced_preprocessing: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            language: "eng".to_string(),
            datapath: None,
            acceptance_threshold: 0.4,
            max_dimension: 2048,
            min_size: 8,
            text_threshold: 0.1,
            canvas_size: 2560,
            advanced_preprocessing: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Model-name substrings in priority order.
    pub model_preference: Vec<String>,
    /// OCR text shorter than this skips the chat round trip.
    pub min_text_len: usize,
    pub vision_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 120,
            model_preference: ["llama3", "llama", "mistral", "qwen", "gemma", "phi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_text_len: 10,
            vision_model: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load the config file when given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => AnalyzerConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BannerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BannerError::Config(format!("Invalid config: {}", e)))
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BANNERSCAN_OLLAMA_URL") {
            debug!("Using chat backend at {}", url);
            self.llm.base_url = url;
        }
        if let Some(flag) = lookup("BANNERSCAN_LLM") {
            let flag = flag.trim().to_lowercase();
            self.llm.enabled = !matches!(flag.as_str(), "off" | "0" | "false" | "no");
        }
        if let Some(model) = lookup("BANNERSCAN_VISION_MODEL") {
            self.llm.vision_model = Some(model).filter(|m| !m.trim().is_empty());
        }
        if let Some(lang) = lookup("BANNERSCAN_OCR_LANG") {
            self.ocr.language = lang;
        }
        if self.ocr.datapath.is_none() {
            self.ocr.datapath = lookup("TESSDATA_PREFIX");
        }
    }
}
