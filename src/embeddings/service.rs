//! Embedding service with fixed backend selection and per-call degrade

use tracing::info;
use tracing::warn;

use super::client::EmbeddingClient;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::Result;

/// Service for generating embeddings.
///
/// Backend selection is fixed at construction: the remote backend is primary
/// when configured, otherwise the local backend; `dimension()` reports the
/// selected backend's output size for the process lifetime. A per-call
/// failure of the primary degrades to the secondary for that call only; when
/// no backend can produce a result the service returns zero vectors, an
/// explicit no-signal sentinel, never an error.
pub struct EmbeddingService {
    primary: Option<EmbeddingClient>,
    secondary: Option<EmbeddingClient>,
    dimension: usize,
}

impl EmbeddingService {
    /// Create a new embedding service from application configuration
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let (primary, secondary) = EmbeddingConfig::resolve(config);
        Self::from_backends(primary, secondary)
    }

    /// Create from explicit backend configurations
    pub fn from_backends(
        primary: Option<EmbeddingConfig>,
        secondary: Option<EmbeddingConfig>,
    ) -> Result<Self> {
        // The selected backend fixes the dimension process-wide; with no
        // backend at all we still need a dimension for the zero sentinel.
        let dimension = primary
            .as_ref()
            .or(secondary.as_ref())
            .map_or(super::DEFAULT_EMBEDDING_DIM, |c| c.dimension);

        let primary = primary.as_ref().map(EmbeddingClient::new).transpose()?;
        let secondary = secondary.as_ref().map(EmbeddingClient::new).transpose()?;

        match (&primary, &secondary) {
            (Some(p), _) => info!(
                "Embedding backend: {:?} (dimension {}), secondary available: {}",
                p.backend(),
                dimension,
                secondary.is_some()
            ),
            (None, Some(s)) => info!(
                "Embedding backend: {:?} (dimension {}), no primary",
                s.backend(),
                dimension
            ),
            (None, None) => warn!(
                "No embedding backend configured; all embeddings will be zero vectors"
            ),
        }

        Ok(Self {
            primary,
            secondary,
            dimension,
        })
    }

    /// The fixed output dimension for this process
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate embeddings for multiple texts, order-preserving. Never fails:
    /// texts no backend could embed come back as zero vectors.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            match self.embed_chunk(chunk).await {
                Some(chunk_embeddings) => embeddings.extend(chunk_embeddings),
                None => {
                    warn!(
                        "No embedding backend available; returning zero vectors for {} texts",
                        chunk.len()
                    );
                    embeddings.extend(chunk.iter().map(|_| vec![0.0; self.dimension]));
                }
            }
        }

        embeddings
    }

    /// Generate an embedding for a single text
    pub async fn embed_one(&self, text: &str) -> Vec<f32> {
        let texts = [text.to_string()];
        self.embed_batch(&texts)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| vec![0.0; self.dimension])
    }

    async fn embed_chunk(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        if let Some(primary) = &self.primary {
            match primary.embed_batch(texts).await {
                Ok(embeddings) => return Some(embeddings),
                Err(e) => warn!("Primary embedding backend failed, degrading: {e}"),
            }
        }

        if let Some(secondary) = &self.secondary {
            // The secondary's dimension may differ from the process-wide one;
            // a mismatch against the stored corpus surfaces as a store error,
            // which retrieval absorbs via the lexical path.
            match secondary.embed_batch(texts).await {
                Ok(embeddings) => return Some(embeddings),
                Err(e) => warn!("Secondary embedding backend failed: {e}"),
            }
        }

        None
    }
}
