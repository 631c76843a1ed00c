use super::{BoundingBox, OcrBackend, OcrParams, OcrToken};
use crate::utils::{BannerError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};
use log::{debug, warn};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tesseract::{PageSegMode, Tesseract};

/// Tesseract-backed OCR.
///
/// The engine handle is created on first use and reused afterwards; a
/// handle lost to a failed call is recreated on the next one.
pub struct TesseractOcr {
    datapath: Option<String>,
    language: String,
    engine: Mutex<Option<EngineHandle>>,
}

/// Owned engine handle, only ever touched while the `engine` lock is held.
struct EngineHandle(Tesseract);

// SAFETY: a Tesseract API instance has no thread affinity; it must only not
// be used from two threads at once, which the surrounding Mutex rules out.
unsafe impl Send for EngineHandle {}

impl TesseractOcr {
    pub fn new(datapath: Option<String>, language: &str) -> Self {
        TesseractOcr {
            datapath,
            language: language.to_string(),
            engine: Mutex::new(None),
        }
    }

    fn init_engine(&self) -> Result<Tesseract> {
        debug!("Initializing Tesseract ({})", self.language);
        Tesseract::new(self.datapath.as_deref(), Some(&self.language))
            .map_err(|e| BannerError::BackendUnavailable(format!("Tesseract init error: {}", e)))
    }

    // Tesseract reads from disk, so each bitmap goes through a temp PNG
    fn write_temp_png(image: &GrayImage) -> Result<NamedTempFile> {
        let temp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| BannerError::BackendUnavailable(format!("Failed to write temp image: {}", e)))?;
        Ok(temp_file)
    }
}

impl OcrBackend for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, params: &OcrParams) -> Result<Vec<OcrToken>> {
        let (width, height) = image.dimensions();
        let fitted;
        let image = if width.max(height) > params.canvas_size {
            fitted = DynamicImage::ImageLuma8(image.clone())
                .resize(params.canvas_size, params.canvas_size, FilterType::Triangle)
                .to_luma8();
            &fitted
        } else {
            image
        };

        let temp_file = Self::write_temp_png(image)?;
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| BannerError::BackendUnavailable("Temp path is not valid UTF-8".to_string()))?;

        let mut guard = self
            .engine
            .lock()
            .map_err(|_| BannerError::BackendUnavailable("Tesseract handle poisoned".to_string()))?;

        let mut tess = match guard.take() {
            Some(EngineHandle(tess)) => tess,
            None => self.init_engine()?,
        };
        tess.set_page_seg_mode(PageSegMode::PsmSparseText);

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| BannerError::BackendUnavailable(format!("Tesseract set image error: {}", e)))?
            .recognize()
            .map_err(|e| BannerError::BackendUnavailable(format!("Tesseract recognize error: {}", e)))?;

        let tsv = tess.get_tsv_text(0);
        *guard = Some(EngineHandle(tess));
        let tsv = tsv.map_err(|e| BannerError::BackendUnavailable(format!("Tesseract TSV error: {}", e)))?;

        let tokens = parse_tsv(&tsv, params);
        if tokens.is_empty() {
            warn!("Tesseract found no tokens on {}x{} image", image.width(), image.height());
        }
        Ok(tokens)
    }
}

/// Parse Tesseract TSV output into word tokens.
///
/// Columns: level, page, block, par, line, word, left, top, width, height,
/// conf, text. Only word rows (level 5) with text are kept.
pub fn parse_tsv(tsv: &str, params: &OcrParams) -> Vec<OcrToken> {
    let mut tokens = Vec::new();

    for row in tsv.lines() {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0].trim() != "5" {
            continue;
        }

        let text = columns[11..].join(" ").trim().to_string();
        if text.is_empty() {
            continue;
        }

        let number = |i: usize| columns[i].trim().parse::<u32>().unwrap_or(0);
        let bbox = BoundingBox {
            left: number(6),
            top: number(7),
            width: number(8),
            height: number(9),
        };
        let confidence = columns[10].trim().parse::<f32>().unwrap_or(-1.0) / 100.0;

        if confidence < params.text_threshold || bbox.height < params.min_size {
            continue;
        }

        tokens.push(OcrToken {
            bbox,
            text,
            confidence: confidence.clamp(0.0, 1.0),
        });
    }

    tokens
}
