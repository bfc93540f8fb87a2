use std::collections::BTreeMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::Translator;
use super::common::{build_client, check_batch_len, common_languages, ensure_success, is_auto};
use crate::config::TranslateConfig;
use crate::error::{Result, TransDictError};

const WEB_ENDPOINT: &str = "https://translate.googleapis.com";
const CLOUD_ENDPOINT: &str = "https://translation.googleapis.com";

fn endpoint_or(config: &TranslateConfig, default: &str) -> String {
    if config.endpoint.trim().is_empty() {
        default.to_string()
    } else {
        config.endpoint.trim_end_matches('/').to_string()
    }
}

/// Google Translate through the public web endpoint (no key, one string per request)
pub struct GoogleWebTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleWebTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: endpoint_or(config, WEB_ENDPOINT),
        })
    }
}

/// Concatenate the sentence chunks of a `translate_a/single` response
fn parse_web_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TransDictError::Oracle("Unexpected Google response shape".to_string()))?;

    Ok(sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect())
}

#[async_trait]
impl Translator for GoogleWebTranslator {
    fn name(&self) -> &str {
        "Google Translate"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);
        let source = if is_auto(source) { "auto" } else { source };

        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TransDictError::Oracle(format!("HTTP request failed: {}", e)))?;

        let body: Value = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| TransDictError::Oracle(format!("Failed to parse response: {}", e)))?;

        parse_web_response(&body)
    }

    async fn supported_languages(&self) -> Result<BTreeMap<String, String>> {
        Ok(common_languages())
    }
}

#[derive(Debug, Serialize)]
struct CloudTranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct CloudResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CloudTranslations {
    translations: Vec<CloudTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudTranslation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct CloudLanguages {
    languages: Vec<CloudLanguage>,
}

#[derive(Debug, Deserialize)]
struct CloudLanguage {
    language: String,
    name: Option<String>,
}

/// Google Cloud Translation v2 (API key, batch capable)
pub struct GoogleCloudTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleCloudTranslator {
    pub fn new(config: &TranslateConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: endpoint_or(config, CLOUD_ENDPOINT),
            api_key,
        })
    }

    async fn request(&self, texts: &[String], source: &str, target: &str) -> Result<Vec<String>> {
        let url = format!("{}/language/translate/v2", self.endpoint);
        let request = CloudTranslateRequest {
            q: texts,
            target,
            source: (!is_auto(source)).then_some(source),
            format: "text",
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TransDictError::Oracle(format!("HTTP request failed: {}", e)))?;

        let parsed: CloudResponse<CloudTranslations> = ensure_success(self.name(), response)
            .await?
            .json()
            .await
            .map_err(|e| TransDictError::Oracle(format!("Failed to parse response: {}", e)))?;

        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }
}

#[async_trait]
impl Translator for GoogleCloudTranslator {
    fn name(&self) -> &str {
        "Google Cloud"
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.request(&[text.to_string()], source, target)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TransDictError::Oracle("Google Cloud returned no translation".to_string()))
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
        let url = format!("{}/language/translate/v2/languages", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("target", "en")])
            .send()
            .await?;

        let parsed: CloudResponse<CloudLanguages> =
            ensure_success(self.name(), response).await?.json().await?;

        Ok(parsed
            .data
            .languages
            .into_iter()
            .map(|l| {
                let name = l.name.unwrap_or_else(|| l.language.clone());
                (l.language, name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_web_response_joins_sentences() {
        let body = json!([[["Bonjour. ", "Hello. ", null], ["Le monde", "The world", null]], null, "en"]);
        assert_eq!(parse_web_response(&body).unwrap(), "Bonjour. Le monde");
    }

    #[test]
    fn test_parse_web_response_rejects_unknown_shape() {
        assert!(parse_web_response(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn test_cloud_request_omits_auto_source() {
        let texts = vec!["Hi".to_string()];
        let request = CloudTranslateRequest {
            q: &texts,
            target: "de",
            source: None,
            format: "text",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"q": ["Hi"], "target": "de", "format": "text"}));
    }

    #[test]
    fn test_cloud_response_parsing() {
        let parsed: CloudResponse<CloudTranslations> = serde_json::from_value(json!({
            "data": {"translations": [{"translatedText": "Hallo", "detectedSourceLanguage": "en"}]}
        }))
        .unwrap();
        assert_eq!(parsed.data.translations[0].translated_text, "Hallo");
    }
}
