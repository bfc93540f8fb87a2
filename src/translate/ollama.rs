use std::collections::BTreeMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::Translator;
use super::common::{build_client, common_languages, ensure_success, is_auto, language_name};
use crate::config::TranslateConfig;
use crate::error::{Result, TransDictError};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local LLM served by Ollama
pub struct OllamaTranslator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let endpoint = if config.endpoint.trim().is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint,
            model: config.model.clone(),
        })
    }

    /// Build translation prompt, using JSON format
    fn build_prompt(&self, text: &str, source: &str, target: &str) -> String {
        let target_name = language_name(target);
        let source_line = if is_auto(source) {
            String::new()
        } else {
            format!("The source language is: {} (language code: {})\n", language_name(source), source)
        };

        format!(
            "You are a professional game localization translator.\n\
             \n\
             CRITICAL: You must translate the text to {} ONLY.\n\
             {}\
             The target language is: {} (language code: {})\n\
             Tokens such as /NAME/, ¤0¤ or [[MARKER_0]] are placeholders: copy them unchanged.\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             [Text to translate]\n\
             {}\n",
            target_name, source_line, target_name, target, target_name, text
        )
    }
}

/// Extract the translation from a raw model answer
fn clean_response(raw: &str) -> String {
    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        return result.text.trim().to_string();
    }

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("Here is")
            || trimmed.starts_with("Here are")
            || trimmed.starts_with("Translation:")
        {
            continue;
        }
        return trimmed.to_string();
    }

    raw.trim().to_string()
}

#[async_trait]
impl Translator for OllamaTranslator {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(text, source, target),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransDictError::Oracle(format!("HTTP request failed: {}", e)))?;

        let generated: GenerateResponse = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| TransDictError::Oracle(format!("Failed to parse response: {}", e)))?;

        let raw = generated.response.trim();
        debug!("Raw Ollama response: {}", raw);

        if raw.is_empty() {
            return Err(TransDictError::Oracle("Empty translation received".to_string()));
        }

        Ok(clean_response(raw))
    }

    async fn supported_languages(&self) -> Result<BTreeMap<String, String>> {
        Ok(common_languages())
    }

    /// Check that Ollama is reachable and the model is pulled
    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": self.model }))
            .send()
            .await
            .map_err(|e| TransDictError::Oracle(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.model);
            Ok(())
        } else {
            Err(TransDictError::Config(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.model, self.model
            )))
        }
    }
}
