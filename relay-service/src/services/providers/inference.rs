//! Text-completion provider.
//!
//! Talks to a Hugging Face style inference endpoint. Hosted models answer in
//! several JSON shapes; [`extract_generated_text`] accepts all of them.

use super::{CompletionParams, CompletionProvider, ProviderError};
use crate::config::InferenceConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;

pub struct HuggingFaceProvider {
    api_url: String,
    api_key: Secret<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
}

impl HuggingFaceProvider {
    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &InferenceConfig) -> Result<Option<Self>, ProviderError> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.is_configured()) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        Ok(Some(Self {
            api_url: config.api_url.clone(),
            api_key,
            client,
        }))
    }
}

#[async_trait]
impl CompletionProvider for HuggingFaceProvider {
    async fn complete(
        &self,
        prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, ProviderError> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
            },
        };

        tracing::debug!(
            url = %self.api_url,
            prompt_len = prompt.len(),
            "Sending request to inference API"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "Inference API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("Failed to parse response: {}", e)))?;

        Ok(extract_generated_text(&body))
    }
}

/// Pull the generated text out of whichever response shape the model returned.
/// Unknown shapes yield an empty string.
pub fn extract_generated_text(body: &Value) -> String {
    let text = match body {
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(Value::as_str),
        Value::Object(_) => body
            .get("generated_text")
            .and_then(Value::as_str)
            .or_else(|| {
                let choice = body.get("choices")?.get(0)?;
                choice
                    .get("text")
                    .and_then(Value::as_str)
                    .or_else(|| choice.get("message")?.get("content")?.as_str())
            }),
        _ => None,
    };

    text.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INFERENCE_URL;
    use serde_json::json;

    #[test]
    fn reads_list_shape() {
        let body = json!([{ "generated_text": "YES" }]);
        assert_eq!(extract_generated_text(&body), "YES");
    }

    #[test]
    fn reads_object_shape() {
        let body = json!({ "generated_text": "no" });
        assert_eq!(extract_generated_text(&body), "no");
    }

    #[test]
    fn reads_chat_completion_shape() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": "Yes." } }] });
        assert_eq!(extract_generated_text(&body), "Yes.");

        let body = json!({ "choices": [{ "text": " YES" }] });
        assert_eq!(extract_generated_text(&body), " YES");
    }

    #[test]
    fn unknown_shape_is_empty() {
        assert_eq!(extract_generated_text(&json!({ "error": "loading" })), "");
        assert_eq!(extract_generated_text(&json!([])), "");
        assert_eq!(extract_generated_text(&json!("YES")), "");
    }

    #[test]
    fn missing_key_disables_provider() {
        let config = InferenceConfig {
            api_url: DEFAULT_INFERENCE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
        };
        assert!(HuggingFaceProvider::from_config(&config).unwrap().is_none());
    }
}
