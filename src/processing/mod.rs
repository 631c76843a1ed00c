pub mod confidence;
pub mod extractors;
pub mod image;
pub mod llm;
pub mod patterns;
pub mod strategy;
pub mod text_cleaner;

pub use confidence::ConfidenceFusion;
pub use extractors::FieldExtractor;
pub use image::{ImageInput, ImageProcessor, PreprocessVariant};
pub use llm::{LlmOutcome, LlmStructurer};
pub use strategy::StrategySelector;
pub use text_cleaner::TextCleaner;
