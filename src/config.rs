use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, TransDictError};

// Default values for optional configuration keys
fn default_batch_chunk_size() -> usize {
    100
}

fn default_min_import_progress() -> u8 {
    95
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
    pub dictionary: DictionaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation backend to drive
    pub provider: ProviderKind,
    /// Endpoint override; empty means the provider's public default
    pub endpoint: String,
    /// API key for providers that need one (DeepL, Google Cloud)
    pub api_key: Option<String>,
    /// LLM model, only used by the Ollama provider
    pub model: String,
    /// Source language code, "auto" lets the provider detect it
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Entries per checkpoint when translating one string at a time
    pub chunk_size: usize,
    /// Entries per checkpoint when the provider supports batch requests
    #[serde(default = "default_batch_chunk_size")]
    pub batch_chunk_size: usize,
    /// Consecutive failures tolerated before the run is aborted
    pub failure_threshold: u32,
    /// HTTP timeout per request in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Google Translate public web endpoint (no key)
    Google,
    /// Google Cloud Translation v2 (API key, batch capable)
    GoogleCloud,
    /// DeepL v2 (API key, batch capable)
    Deepl,
    /// Local LLM served by Ollama
    Ollama,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "google-cloud" | "googlecloud" | "gcloud" => Ok(Self::GoogleCloud),
            "deepl" => Ok(Self::Deepl),
            "ollama" => Ok(Self::Ollama),
            other => Err(TransDictError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Extension used when deriving a dictionary path from a source file
    pub extension: String,
    /// Minimum progress required before `import` writes without `--force`
    #[serde(default = "default_min_import_progress")]
    pub min_import_progress: u8,
    /// Keep a one-time `.backup` copy of the source before importing in place
    pub backup_source: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                provider: ProviderKind::Google,
                endpoint: String::new(),
                api_key: None,
                model: "llama3.2:3b".to_string(),
                source_language: "auto".to_string(),
                target_language: "en".to_string(),
                chunk_size: 200,
                batch_chunk_size: 100,
                failure_threshold: 10,
                timeout_secs: 60,
            },
            dictionary: DictionaryConfig {
                extension: "dict".to_string(),
                min_import_progress: 95,
                backup_source: true,
            },
        }
    }
}

impl TranslateConfig {
    /// Chunk size to use for the given provider capability
    pub fn effective_chunk_size(&self, batch: bool) -> usize {
        if batch { self.batch_chunk_size } else { self.chunk_size }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransDictError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TransDictError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TransDictError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
