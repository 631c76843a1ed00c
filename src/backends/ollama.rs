use super::{ChatBackend, ImageUnderstanding, ModelDescriptor};
use crate::config::LlmConfig;
use crate::utils::{BannerError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Cursor;
use std::time::Duration;

/// HTTP client for an Ollama-compatible server.
///
/// Serves as the chat backend and, when a vision model is set, as the
/// image-understanding backend.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    vision_model: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BannerError::BackendUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(OllamaClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vision_model: None,
        })
    }

    pub fn with_vision_model(mut self, model: &str) -> Self {
        self.vision_model = Some(model.to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str, body: &Value) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| BannerError::BackendUnavailable(format!("POST {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(BannerError::BackendUnavailable(format!(
                "POST {} returned {}",
                path,
                response.status()
            )));
        }
        Ok(response)
    }

    fn generate_with_image(&self, image: &DynamicImage, prompt: &str) -> Result<String> {
        let model = self
            .vision_model
            .as_deref()
            .ok_or_else(|| BannerError::BackendUnavailable("No vision model configured".to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| BannerError::DecodeFailure(format!("Failed to encode image: {}", e)))?;

        let body = json!({
            "model": model,
            "prompt": prompt,
            "images": [STANDARD.encode(&png)],
            "stream": false,
        });

        let reply: GenerateResponse = self.post("/api/generate", &body)?.json().map_err(|e| {
            BannerError::MalformedStructuredOutput(format!("Unexpected generate response: {}", e))
        })?;
        Ok(reply.response.trim().to_string())
    }
}

impl ChatBackend for OllamaClient {
    fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .map_err(|e| BannerError::BackendUnavailable(format!("Model listing failed: {}", e)))?;

        let listing: Value = response
            .json()
            .map_err(|e| BannerError::BackendUnavailable(format!("Model listing unreadable: {}", e)))?;

        let models = ModelDescriptor::from_listing(listing);
        debug!("Chat backend lists {} models", models.len());
        Ok(models)
    }

    fn complete(&self, model: &str, prompt: &str, require_json: bool) -> Result<String> {
        let mut body = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
            "options": {"temperature": 0.1},
        });
        if require_json {
            body["format"] = json!("json");
        }

        let reply: ChatResponse = self.post("/api/chat", &body)?.json().map_err(|e| {
            BannerError::MalformedStructuredOutput(format!("Unexpected chat response: {}", e))
        })?;
        Ok(reply.message.content)
    }
}

impl ImageUnderstanding for OllamaClient {
    fn caption(&self, image: &DynamicImage) -> Result<String> {
        self.generate_with_image(image, "Describe this event banner in one sentence.")
    }

    fn answer(&self, image: &DynamicImage, question: &str) -> Result<String> {
        let prompt = format!("{} Answer in a few words.", question);
        self.generate_with_image(image, &prompt)
    }
}
