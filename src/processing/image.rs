use crate::utils::{BannerError, Result};
use image::imageops::{brighten, contrast, FilterType};
use image::{DynamicImage, GrayImage};
use log::debug;
use std::path::PathBuf;

#[cfg(feature = "advanced-preprocessing")]
use imageproc::{
    contrast::{adaptive_threshold, equalize_histogram, otsu_level, threshold},
    filter::{bilateral_filter, gaussian_blur_f32, median_filter, sharpen3x3},
};

/// An image handed to the analyzer.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Bitmap(DynamicImage),
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        ImageInput::Bitmap(image)
    }
}

/// One preprocessed rendition of the input image.
#[derive(Debug, Clone)]
pub struct PreprocessVariant {
    pub name: &'static str,
    pub image: GrayImage,
}

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn load(input: &ImageInput) -> Result<DynamicImage> {
        match input {
            ImageInput::Path(path) => image::open(path).map_err(|e| {
                BannerError::DecodeFailure(format!("Failed to open image {}: {}", path.display(), e))
            }),
            ImageInput::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| BannerError::DecodeFailure(format!("Failed to load image: {}", e))),
            ImageInput::Bitmap(image) => Ok(image.clone()),
        }
    }

    /// Shrink so the long side is at most `max_dimension`, keeping aspect ratio.
    pub fn limit_size(image: DynamicImage, max_dimension: u32) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        if width.max(height) <= max_dimension {
            return image;
        }
        debug!("Downscaling {}x{} to fit {}px", width, height, max_dimension);
        image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    }

    /// Build the preprocessing variants tried by the strategy selector.
    ///
    /// The order is fixed; ties during selection keep the earlier variant.
    pub fn variants(image: &DynamicImage, advanced: bool) -> Vec<PreprocessVariant> {
        let gray = image.to_luma8();

        if advanced {
            if let Some(variants) = Self::advanced_variants(&gray) {
                return variants;
            }
        }

        vec![PreprocessVariant {
            name: "basic",
            image: Self::basic_enhance(&gray),
        }]
    }

    /// Grayscale with a contrast and brightness boost.
    pub fn basic_enhance(gray: &GrayImage) -> GrayImage {
        brighten(&contrast(gray, 30.0), 10)
    }

    #[cfg(not(feature = "advanced-preprocessing"))]
    fn advanced_variants(_gray: &GrayImage) -> Option<Vec<PreprocessVariant>> {
        debug!("Advanced preprocessing not compiled in, using basic variant");
        None
    }

    #[cfg(feature = "advanced-preprocessing")]
    fn advanced_variants(gray: &GrayImage) -> Option<Vec<PreprocessVariant>> {
        // Step 1: global histogram equalization
        let contrast_normalized = equalize_histogram(gray);

        // Step 2: local mean thresholding on a lightly blurred copy
        let block_radius = (gray.width().min(gray.height()) / 40).clamp(7, 25);
        let adaptive = adaptive_threshold(&gaussian_blur_f32(gray, 0.8), block_radius);

        // Step 3: median denoise, then sharpen edges back
        let denoised_sharpened = sharpen3x3(&median_filter(gray, 1, 1));

        // Step 4: edge-preserving smoothing
        let bilateral = bilateral_filter(gray, 9, 75.0, 75.0);

        // Step 5: Otsu global binarization
        let binarized = threshold(gray, otsu_level(gray));

        Some(vec![
            PreprocessVariant { name: "contrast_normalized", image: contrast_normalized },
            PreprocessVariant { name: "adaptive_threshold", image: adaptive },
            PreprocessVariant { name: "denoised_sharpened", image: denoised_sharpened },
            PreprocessVariant { name: "bilateral_smoothed", image: bilateral },
            PreprocessVariant { name: "otsu_binarized", image: binarized },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn banner_like(width: u32, height: u32) -> DynamicImage {
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Luma([40u8])
            } else {
                Luma([210u8])
            }
        });
        DynamicImage::ImageLuma8(buffer)
    }

    #[test]
    fn test_limit_size_keeps_aspect_ratio() {
        let resized = ImageProcessor::limit_size(banner_like(4096, 1024), 2048);
        assert_eq!((resized.width(), resized.height()), (2048, 512));

        let untouched = ImageProcessor::limit_size(banner_like(800, 600), 2048);
        assert_eq!((untouched.width(), untouched.height()), (800, 600));
    }

    #[test]
    fn test_basic_variant_when_not_advanced() {
        let variants = ImageProcessor::variants(&banner_like(64, 48), false);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].name, "basic");
        assert_eq!(variants[0].image.dimensions(), (64, 48));
    }

    #[cfg(feature = "advanced-preprocessing")]
    #[test]
    fn test_advanced_variants_are_fixed_and_ordered() {
        let variants = ImageProcessor::variants(&banner_like(120, 80), true);
        let names: Vec<&str> = variants.iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            vec![
                "contrast_normalized",
                "adaptive_threshold",
                "denoised_sharpened",
                "bilateral_smoothed",
                "otsu_binarized"
            ]
        );
        for variant in &variants {
            assert_eq!(variant.image.dimensions(), (120, 80));
        }
    }

    #[test]
    fn test_undecodable_bytes_are_decode_failure() {
        let err = ImageProcessor::load(&ImageInput::Bytes(b"not an image".to_vec())).unwrap_err();
        assert_eq!(err.kind(), "decode_failure");

        let err = ImageProcessor::load(&ImageInput::Path(PathBuf::from("/nonexistent/banner.png"))).unwrap_err();
        assert_eq!(err.kind(), "decode_failure");
    }
}
