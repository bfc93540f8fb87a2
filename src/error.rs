use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransDictError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Translation error: {0}")]
    Oracle(String),

    #[error("Batch translation error: {0}")]
    BatchOracle(String),

    #[error("Too many consecutive translation failures ({failures}). The provider {provider} may not be working: {last_error}")]
    ThresholdExceeded {
        provider: String,
        failures: u32,
        last_error: String,
    },

    #[error("Dictionary is only {progress}% complete (at least {required}% required)")]
    IncompleteDictionary { progress: u8, required: u8 },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransDictError {
    /// Errors that must abort a pipeline run instead of being absorbed as a
    /// per-item failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ThresholdExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransDictError>;
