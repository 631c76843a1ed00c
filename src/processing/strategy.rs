use super::image::{ImageInput, ImageProcessor, PreprocessVariant};
use crate::backends::{OcrBackend, OcrParams, OcrToken};
use crate::config::OcrConfig;
use crate::models::OcrStrategyResult;
use image::DynamicImage;
use log::{debug, info, warn};

/// Runs every preprocessing variant through OCR and keeps the best reading.
pub struct StrategySelector<'a> {
    backend: &'a dyn OcrBackend,
    params: OcrParams,
    acceptance_threshold: f32,
    max_dimension: u32,
    advanced: bool,
}

impl<'a> StrategySelector<'a> {
    pub fn new(backend: &'a dyn OcrBackend, config: &OcrConfig) -> Self {
        StrategySelector {
            backend,
            params: OcrParams {
                min_size: config.min_size,
                text_threshold: config.text_threshold,
                canvas_size: config.canvas_size,
            },
            acceptance_threshold: config.acceptance_threshold,
            max_dimension: config.max_dimension,
            advanced: config.advanced_preprocessing,
        }
    }

    /// Best `(text, confidence)` for an image; `("", 0.0)` if undecodable.
    pub fn select(&self, input: &ImageInput) -> OcrStrategyResult {
        match ImageProcessor::load(input) {
            Ok(image) => self.select_from_image(&image),
            Err(e) => {
                warn!("{}", e);
                OcrStrategyResult::empty("none")
            }
        }
    }

    pub fn select_from_image(&self, image: &DynamicImage) -> OcrStrategyResult {
        let attempts = self.evaluate_all(image);
        Self::pick_best(attempts)
    }

    /// Score every variant of `image`, in variant order.
    pub fn evaluate_all(&self, image: &DynamicImage) -> Vec<OcrStrategyResult> {
        let image = ImageProcessor::limit_size(image.clone(), self.max_dimension);
        let variants = ImageProcessor::variants(&image, self.advanced);
        self.evaluate_variants(&variants)
    }

    pub fn evaluate_variants(&self, variants: &[PreprocessVariant]) -> Vec<OcrStrategyResult> {
        variants.iter().map(|variant| self.evaluate(variant)).collect()
    }

    fn evaluate(&self, variant: &PreprocessVariant) -> OcrStrategyResult {
        let tokens = match self.backend.recognize(&variant.image, &self.params) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("OCR failed for variant {}: {}", variant.name, e);
                return OcrStrategyResult::empty(variant.name);
            }
        };

        let accepted: Vec<OcrToken> = tokens
            .into_iter()
            .filter(|t| t.confidence > self.acceptance_threshold)
            .collect();

        if accepted.is_empty() {
            debug!("Variant {} produced no accepted tokens", variant.name);
            return OcrStrategyResult::empty(variant.name);
        }

        let mean = accepted.iter().map(|t| t.confidence).sum::<f32>() / accepted.len() as f32;
        let result = OcrStrategyResult {
            strategy: variant.name.to_string(),
            text: compose_lines(&accepted).join("\n"),
            average_confidence: mean * 100.0,
            accepted_tokens: accepted.len(),
        };
        debug!(
            "Variant {}: {} tokens, confidence {:.2}",
            result.strategy, result.accepted_tokens, result.average_confidence
        );
        result
    }

    /// Strictly highest confidence wins; ties keep the earlier attempt.
    pub fn pick_best(attempts: Vec<OcrStrategyResult>) -> OcrStrategyResult {
        let mut best: Option<OcrStrategyResult> = None;
        for attempt in attempts {
            if attempt.accepted_tokens == 0 {
                continue;
            }
            let better = match &best {
                Some(current) => attempt.average_confidence > current.average_confidence,
                None => true,
            };
            if better {
                best = Some(attempt);
            }
        }

        match best {
            Some(best) => {
                info!(
                    "Selected OCR strategy {} ({:.2}% confidence, {} chars)",
                    best.strategy,
                    best.average_confidence,
                    best.text.len()
                );
                best
            }
            None => OcrStrategyResult::empty("none"),
        }
    }
}

/// Group tokens into text lines by vertical position.
///
/// A token joins the current line when its vertical centre is within half
/// a line height of the line's centre. Lines run top to bottom, tokens
/// within a line left to right.
pub fn compose_lines(tokens: &[OcrToken]) -> Vec<String> {
    let mut sorted: Vec<&OcrToken> = tokens.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .center_y()
            .total_cmp(&b.bbox.center_y())
            .then(a.bbox.left.cmp(&b.bbox.left))
    });

    let mut lines: Vec<Vec<&OcrToken>> = Vec::new();
    let mut line_center = 0.0f32;
    let mut line_height = 0.0f32;

    for token in sorted {
        let center = token.bbox.center_y();
        let height = token.bbox.height as f32;
        let joins = match lines.last() {
            Some(_) => (center - line_center).abs() <= line_height.max(height) / 2.0,
            None => false,
        };

        if joins {
            if let Some(line) = lines.last_mut() {
                line.push(token);
                let count = line.len() as f32;
                line_center += (center - line_center) / count;
                line_height = line_height.max(height);
            }
        } else {
            lines.push(vec![token]);
            line_center = center;
            line_height = height;
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by_key(|t| t.bbox.left);
            line.iter().map(|t| t.text.trim()).collect::<Vec<_>>().join(" ")
        })
        .collect()
}
