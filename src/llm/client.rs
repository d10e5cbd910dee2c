//! Generation provider client with bounded retries and backoff

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::config::LlmConfig;
use crate::errors::FarmGuruError;
use crate::errors::Result;

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
}

/// The provider answers either with generated text (bare or as a one-element
/// list) or with a structured error body.
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: String },
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Client for a hosted text-generation endpoint.
///
/// Each call makes up to `max_attempts` requests: rate-limiting and temporary
/// unavailability (429/503) and transport errors wait with linearly increasing
/// backoff and retry; anything else fails immediately. All failures surface as
/// [`FarmGuruError::GenerationUnavailable`], which the pipeline absorbs into
/// the deterministic fallback. The raw successful payload is returned
/// unmodified; schema interpretation is the validator's job.
pub struct LlmClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_new_tokens: u32,
    temperature: f32,
    max_attempts: u32,
    backoff_base: Duration,
    client: Client,
}

impl LlmClient {
    /// Create a new generation client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FarmGuruError::Http(e.to_string()))?;

        let api_key = if config.api_key.trim().is_empty() {
            None
        } else {
            Some(config.api_key.clone())
        };

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_secs(config.backoff_base_secs),
            client,
        })
    }

    /// Generate text for a prompt
    ///
    /// # Errors
    /// - [`FarmGuruError::GenerationUnavailable`] when no API key is
    ///   configured, the provider keeps rate-limiting past the retry budget,
    ///   or it answers with any other error
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(FarmGuruError::GenerationUnavailable(
                "no generation API key configured".to_string(),
            ));
        };

        let url = format!("{}/{}", self.endpoint, self.model);
        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.max_new_tokens,
                temperature: self.temperature,
            },
        };

        for attempt in 1..=self.max_attempts {
            debug!("Generation attempt {}/{}", attempt, self.max_attempts);

            let response = match self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    // Transport errors and timeouts count as temporary
                    // unavailability.
                    warn!(
                        "Attempt {}/{}: generation request failed: {e}",
                        attempt, self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff_base * attempt).await;
                        continue;
                    }
                    return Err(FarmGuruError::GenerationUnavailable(e.to_string()));
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
            {
                warn!(
                    "Attempt {}/{}: provider unavailable ({status})",
                    attempt, self.max_attempts
                );
                if attempt < self.max_attempts {
                    tokio::time::sleep(self.backoff_base * attempt).await;
                    continue;
                }
                return Err(FarmGuruError::GenerationUnavailable(format!(
                    "provider still unavailable after {} attempts ({status})",
                    self.max_attempts
                )));
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(FarmGuruError::GenerationUnavailable(format!(
                    "provider error ({status}): {error_text}"
                )));
            }

            let body: GenerationResponse = response.json().await.map_err(|e| {
                FarmGuruError::GenerationUnavailable(format!("unexpected response format: {e}"))
            })?;

            return match body {
                GenerationResponse::Batch(mut items) if !items.is_empty() => {
                    Ok(items.remove(0).generated_text)
                }
                GenerationResponse::Single(item) => Ok(item.generated_text),
                GenerationResponse::Error { error } => Err(FarmGuruError::GenerationUnavailable(
                    format!("provider error: {error}"),
                )),
                GenerationResponse::Batch(_) => Err(FarmGuruError::GenerationUnavailable(
                    "empty generation response".to_string(),
                )),
            };
        }

        Err(FarmGuruError::GenerationUnavailable(
            "retry budget exhausted".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_without_key() -> LlmClient {
        let config = LlmConfig {
            api_key: String::new(),
            ..LlmConfig::default()
        };
        LlmClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_without_api_key_is_unavailable() {
        let client = client_without_key();
        let result = client.generate("any prompt").await;
        assert!(matches!(
            result,
            Err(FarmGuruError::GenerationUnavailable(_))
        ));
    }

    #[test]
    fn test_response_format_variants() {
        let batch: GenerationResponse =
            serde_json::from_str(r#"[{"generated_text": "hello"}]"#).unwrap();
        assert!(matches!(batch, GenerationResponse::Batch(_)));

        let single: GenerationResponse =
            serde_json::from_str(r#"{"generated_text": "hello"}"#).unwrap();
        assert!(matches!(single, GenerationResponse::Single(_)));

        let error: GenerationResponse =
            serde_json::from_str(r#"{"error": "model loading"}"#).unwrap();
        assert!(matches!(error, GenerationResponse::Error { .. }));
    }
}
