//! Embeddings generation module
//!
//! Turns text into fixed-dimension vectors using a remote primary backend
//! (`OpenAI`) with a local secondary backend (Ollama). The backend and its
//! output dimension are chosen once at startup; a per-call failure of the
//! primary degrades to the secondary for that call only, and when neither
//! backend can answer the service returns zero vectors so that downstream
//! similarity scoring degrades to zero instead of failing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use farmguru::embeddings::EmbeddingService;
//! use farmguru::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed_one("When should I irrigate wheat?").await;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod service;

pub use client::EmbeddingBackend;
pub use client::EmbeddingClient;
pub use service::EmbeddingService;

/// Default embedding dimension (`OpenAI` text-embedding-3-small)
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Maximum batch size per embedding request
pub const MAX_BATCH_SIZE: usize = 100;

/// Configuration for one embedding backend
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    /// Resolve backend configurations once at startup: the remote backend is
    /// primary when an API key is present, the local backend is secondary
    /// when enabled. Returns `(primary, secondary)`.
    pub fn resolve(config: &crate::config::AppConfig) -> (Option<Self>, Option<Self>) {
        let embeddings = &config.embeddings;

        let primary = if embeddings.openai_api_key.trim().is_empty() {
            None
        } else {
            Some(Self {
                backend: EmbeddingBackend::OpenAI,
                model: embeddings.openai_model.clone(),
                dimension: embeddings.openai_dimension,
                endpoint: embeddings.openai_endpoint.clone(),
                api_key: Some(embeddings.openai_api_key.clone()),
            })
        };

        let secondary = embeddings.ollama_enabled.then(|| Self {
            backend: EmbeddingBackend::Ollama,
            model: embeddings.ollama_model.clone(),
            dimension: embeddings.ollama_dimension,
            endpoint: embeddings.ollama_endpoint.clone(),
            api_key: None,
        });

        (primary, secondary)
    }
}

/// Cosine similarity between two vectors: `dot(a,b) / (‖a‖·‖b‖)`.
/// Returns `0.0` when either norm is zero or the lengths differ; undefined
/// similarity is treated as no-match, not an error.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5, 0.5, 0.5];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_similarity(&a, &b)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_is_zero_not_error() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch_is_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
