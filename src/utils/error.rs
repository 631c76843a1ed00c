use thiserror::Error;

/// Errors raised inside the analysis pipeline.
///
/// Every variant except `Config` and `Io` is recoverable at some tier of the
/// pipeline: `BannerAnalyzer::analyze` turns them into fallback decisions and
/// never returns them to the caller.
#[derive(Error, Debug)]
pub enum BannerError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Image decode failure: {0}")]
    DecodeFailure(String),

    #[error("Malformed structured output: {0}")]
    MalformedStructuredOutput(String),

    #[error("Insufficient signal: {0}")]
    InsufficientSignal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BannerError {
    /// Short machine-readable tag, used in `debug_info`.
    pub fn kind(&self) -> &'static str {
        match self {
            BannerError::BackendUnavailable(_) => "backend_unavailable",
            BannerError::DecodeFailure(_) => "decode_failure",
            BannerError::MalformedStructuredOutput(_) => "malformed_structured_output",
            BannerError::InsufficientSignal(_) => "insufficient_signal",
            BannerError::Config(_) => "config",
            BannerError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, BannerError>;
