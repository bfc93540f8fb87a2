use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;
use tracing::warn;

use super::{BatchOracle, Oracle, Translator};
use crate::error::{Result, TransDictError};

/// Binds a translator to a language pair and aborts the run once too many
/// requests in a row have failed.
pub struct GuardedOracle {
    translator: Arc<dyn Translator>,
    source: String,
    target: String,
    failure_threshold: u32,
    consecutive_failures: AtomicU32,
}

impl GuardedOracle {
    pub fn new(
        translator: Arc<dyn Translator>,
        source: impl Into<String>,
        target: impl Into<String>,
        failure_threshold: u32,
    ) -> Self {
        Self {
            translator,
            source: source.into(),
            target: target.into(),
            failure_threshold: failure_threshold.max(1),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    fn record_failure(&self, error: TransDictError) -> TransDictError {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(
            "{} failed ({}/{} consecutive): {}",
            self.translator.name(),
            failures,
            self.failure_threshold,
            error
        );

        if failures >= self.failure_threshold {
            TransDictError::ThresholdExceeded {
                provider: self.translator.name().to_string(),
                failures,
                last_error: error.to_string(),
            }
        } else {
            match error {
                TransDictError::Oracle(_) => error,
                other => TransDictError::Oracle(other.to_string()),
            }
        }
    }
}

#[async_trait]
impl Oracle for GuardedOracle {
    async fn translate(&self, text: &str) -> Result<String> {
        let failures = self.consecutive_failures();
        if failures >= self.failure_threshold {
            return Err(TransDictError::ThresholdExceeded {
                provider: self.translator.name().to_string(),
                failures,
                last_error: "threshold already reached".to_string(),
            });
        }

        match self.translator.translate(text, &self.source, &self.target).await {
            Ok(translated) if translated.trim().is_empty() && !text.trim().is_empty() => Err(
                self.record_failure(TransDictError::Oracle("Empty translation received".to_string())),
            ),
            Ok(translated) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                Ok(translated)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }
}

/// Batch endpoint of a translator bound to a language pair
pub struct BatchBinding {
    translator: Arc<dyn Translator>,
    source: String,
    target: String,
}

impl BatchBinding {
    /// `None` when the translator has no batch endpoint
    pub fn new(
        translator: Arc<dyn Translator>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Option<Self> {
        translator.supports_batch().then(|| Self {
            translator,
            source: source.into(),
            target: target.into(),
        })
    }
}

#[async_trait]
impl BatchOracle for BatchBinding {
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        self.translator
            .translate_batch(texts, &self.source, &self.target)
            .await
    }
}
