pub mod backends;
pub mod banner_analyzer;
pub mod config;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use banner_analyzer::BannerAnalyzer;
pub use config::AnalyzerConfig;
pub use models::{AnalysisResult, Confidence, EventRecord};
pub use processing::ImageInput;
