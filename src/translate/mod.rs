// Translation providers and the oracle abstractions the pipeline drives
//
// - Translator: a concrete backend (Google, Google Cloud, DeepL, Ollama)
//   translating between two language codes
// - Oracle / BatchOracle: a backend bound to one language pair, which is all
//   the pipeline and the placeholder-preserving translator need to know

pub mod common;
pub mod constants;
pub mod deepl;
pub mod google;
pub mod guard;
pub mod ollama;
pub mod preserve;

use std::collections::BTreeMap;
use std::sync::Arc;
use async_trait::async_trait;

pub use constants::{contains_all_constants, extract_constants};
pub use guard::{BatchBinding, GuardedOracle};
pub use preserve::translate_preserving;
use crate::config::{ProviderKind, TranslateConfig};
use crate::error::{Result, TransDictError};

/// A machine translation backend
#[async_trait]
pub trait Translator: Send + Sync {
    /// Display name used in logs and error messages
    fn name(&self) -> &str;

    /// Translate one string from `source` to `target`
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;

    /// Whether `translate_batch` is backed by a real batch endpoint
    fn supports_batch(&self) -> bool {
        false
    }

    /// Translate many strings in one request; output order and length match the input
    async fn translate_batch(
        &self,
        _texts: &[String],
        _source: &str,
        _target: &str,
    ) -> Result<Vec<String>> {
        Err(TransDictError::BatchOracle(format!(
            "{} does not support batch translation",
            self.name()
        )))
    }

    /// Supported language codes mapped to display names
    async fn supported_languages(&self) -> Result<BTreeMap<String, String>>;

    /// Verify the backend is reachable and configured
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Single-string translation capability bound to a language pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// List translation capability bound to a language pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchOracle: Send + Sync {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator for the configured provider
    pub fn create_translator(config: &TranslateConfig) -> Result<Arc<dyn Translator>> {
        let translator: Arc<dyn Translator> = match config.provider {
            ProviderKind::Google => Arc::new(google::GoogleWebTranslator::new(config)?),
            ProviderKind::GoogleCloud => Arc::new(google::GoogleCloudTranslator::new(
                config,
                Self::require_key(config, "Google Cloud")?,
            )?),
            ProviderKind::Deepl => Arc::new(deepl::DeeplTranslator::new(
                config,
                Self::require_key(config, "DeepL")?,
            )?),
            ProviderKind::Ollama => Arc::new(ollama::OllamaTranslator::new(config)?),
        };
        Ok(translator)
    }

    fn require_key(config: &TranslateConfig, provider: &str) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                TransDictError::Config(format!("{} requires translate.api_key to be set", provider))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_factory_requires_api_key() {
        let mut config = Config::default().translate;
        config.provider = ProviderKind::Deepl;
        assert!(matches!(
            TranslatorFactory::create_translator(&config),
            Err(TransDictError::Config(_))
        ));

        config.api_key = Some("abc:fx".to_string());
        let translator = TranslatorFactory::create_translator(&config).unwrap();
        assert_eq!(translator.name(), "DeepL");
        assert!(translator.supports_batch());
    }

    #[test]
    fn test_factory_default_provider() {
        let translator = TranslatorFactory::create_translator(&Config::default().translate).unwrap();
        assert_eq!(translator.name(), "Google Translate");
        assert!(!translator.supports_batch());
    }
}
