//! Embedding API clients for the supported backends

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::FarmGuruError;
use crate::errors::Result;

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// `OpenAI` embeddings API (remote primary)
    OpenAI,
    /// Ollama local embeddings (secondary)
    Ollama,
}

/// Client for generating embeddings from a single backend
pub struct EmbeddingClient {
    backend: EmbeddingBackend,
    model: String,
    dimension: usize,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &super::EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| FarmGuruError::Http(e.to_string()))?;

        Ok(Self {
            backend: config.backend,
            model: config.model.clone(),
            dimension: config.dimension,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// The output dimension of this backend
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// The backend this client talks to
    #[must_use]
    pub const fn backend(&self) -> EmbeddingBackend {
        self.backend
    }

    /// Generate embeddings for multiple texts, order-preserving, one vector
    /// per input.
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication)
    /// - Invalid API responses (malformed JSON, wrong embedding dimension,
    ///   wrong result count)
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = match self.backend {
            EmbeddingBackend::OpenAI => self.embed_batch_openai(texts).await?,
            EmbeddingBackend::Ollama => {
                // Ollama has no batch endpoint; calls stay sequential so a
                // single query never fans out.
                let mut embeddings = Vec::with_capacity(texts.len());
                for text in texts {
                    embeddings.push(self.embed_ollama(text).await?);
                }
                embeddings
            }
        };

        if embeddings.len() != texts.len() {
            return Err(FarmGuruError::Embedding(format!(
                "Backend returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        if let Some(embedding) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(FarmGuruError::Embedding(format!(
                "Expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        Ok(embeddings)
    }

    /// Generate embeddings in batch using the `OpenAI` API
    async fn embed_batch_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FarmGuruError::Config("OpenAI API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: &'a [String],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FarmGuruError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FarmGuruError::Embedding(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| FarmGuruError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate a single embedding using the Ollama API
    async fn embed_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FarmGuruError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FarmGuruError::Embedding(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| FarmGuruError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}
