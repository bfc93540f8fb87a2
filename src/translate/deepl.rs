use std::collections::BTreeMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Translator;
use super::common::{build_client, check_batch_len, ensure_success, is_auto};
use crate::config::TranslateConfig;
use crate::error::{Result, TransDictError};

const FREE_ENDPOINT: &str = "https://api-free.deepl.com";
const PRO_ENDPOINT: &str = "https://api.deepl.com";

#[derive(Debug, Serialize)]
struct DeeplRequest<'a> {
    text: &'a [String],
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DeeplLanguage {
    language: String,
    name: String,
}

/// DeepL v2 REST API
pub struct DeeplTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl DeeplTranslator {
    pub fn new(config: &TranslateConfig, api_key: String) -> Result<Self> {
        let endpoint = if !config.endpoint.trim().is_empty() {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            default_endpoint(&api_key).to_string()
        };

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint,
            api_key,
        })
    }

    async fn request(&self, texts: &[String], source: &str, target: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/translate", self.endpoint);
        let request = DeeplRequest {
            text: texts,
            target_lang: target.to_uppercase(),
            // DeepL source codes carry no region ("EN", never "EN-GB")
            source_lang: (!is_auto(source))
                .then(|| source.split('-').next().unwrap_or(source).to_uppercase()),
        };

        debug!("Sending {} texts to {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| TransDictError::Oracle(format!("HTTP request failed: {}", e)))?;

        let parsed: DeeplResponse = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| TransDictError::Oracle(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }
}

/// Free-tier keys end with ":fx" and live on a separate host
fn default_endpoint(api_key: &str) -> &'static str {
    if api_key.trim().ends_with(":fx") {
        FREE_ENDPOINT
    } else {
        PRO_ENDPOINT
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    fn name(&self) -> &str {
        "DeepL"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.request(&[text.to_string()], source, target)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TransDictError::Oracle("DeepL returned no translation".to_string()))
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn translate_batch(&self, texts: &[String], source: &str, target: &str) -> Result<Vec<String>> {
        let translations = self
            .request(texts, source, target)
            .await
            .map_err(|e| TransDictError::BatchOracle(e.to_string()))?;
        check_batch_len(self.name(), texts.len(), translations.len())?;
        Ok(translations)
    }

    async fn supported_languages(&self) -> Result<BTreeMap<String, String>> {
        let url = format!("{}/v2/languages", self.endpoint);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .query(&[("type", "target")])
            .send()
            .await?;

        let languages: Vec<DeeplLanguage> = ensure_success(self.name(), response).await?.json().await?;

        Ok(languages.into_iter().map(|l| (l.language, l.name)).collect())
    }
}
