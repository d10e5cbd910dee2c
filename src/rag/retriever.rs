//! Document retrieval with vector search and lexical fallback

use std::sync::Arc;

use tracing::debug;
use tracing::warn;
use uuid::Uuid;

use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::NewDocument;
use crate::models::RetrievedDoc;

/// Retriever over the document corpus.
///
/// The primary path embeds the query and runs a nearest-neighbor search,
/// keeping only matches above the similarity threshold; a store error or an
/// empty result degrades to full-text search. Retrieval is total: any error
/// in both paths yields an empty list, never a failure. No documents is a
/// valid outcome the pipeline handles downstream.
pub struct Retriever {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
    similarity_threshold: f32,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(
        database: Arc<Database>,
        embedding_service: Arc<EmbeddingService>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            database,
            embedding_service,
            similarity_threshold,
        }
    }

    /// Retrieve up to `limit` documents relevant to the query
    pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<RetrievedDoc> {
        let limit = limit.max(1);

        match self.vector_search(query, limit).await {
            Ok(docs) if !docs.is_empty() => return docs,
            Ok(_) => debug!("Vector search found no matches above threshold"),
            Err(e) => warn!("Vector search failed, degrading to text search: {e}"),
        }

        match self.text_search(query, limit).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Text search failed, returning no documents: {e}");
                Vec::new()
            }
        }
    }

    /// Vector similarity search with threshold filtering
    async fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedDoc>> {
        debug!("Performing vector search: {}", query);

        let query_embedding = self.embedding_service.embed_one(query).await;
        let docs = self
            .database
            .vector_search_docs(&query_embedding, limit as i64)
            .await?;

        let docs = above_threshold(docs, self.similarity_threshold);
        Ok(order_by_score(docs))
    }

    /// Lexical full-text search
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedDoc>> {
        debug!("Performing text search: {}", query);

        let docs = self.database.text_search_docs(query, limit as i64).await?;
        Ok(order_by_score(docs))
    }

    /// Add a document to the corpus, producing and persisting its embedding.
    ///
    /// When no embedding backend can produce a signal the document is stored
    /// without an embedding; it stays reachable through text search.
    pub async fn add_document(&self, doc: &NewDocument) -> Result<Uuid> {
        let embedding = self.embedding_service.embed_one(&doc.content).await;
        let embedding = usable_embedding(&embedding);

        let id = self.database.insert_doc(doc, embedding).await?;
        debug!("Added document {} ({})", id, doc.title);
        Ok(id)
    }

    /// Update a document's content, re-embedding it
    pub async fn update_document(&self, id: Uuid, content: &str) -> Result<()> {
        let embedding = self.embedding_service.embed_one(content).await;
        let embedding = usable_embedding(&embedding);

        self.database.update_doc_content(id, content, embedding).await
    }
}

/// The zero vector is the embedding service's no-signal sentinel; storing it
/// would make the row vector-searchable with an undefined similarity.
fn usable_embedding(embedding: &[f32]) -> Option<&[f32]> {
    embedding.iter().any(|v| *v != 0.0).then_some(embedding)
}

/// Keep only matches strictly above the similarity threshold. NaN scores
/// (undefined similarity) never pass.
fn above_threshold(docs: Vec<RetrievedDoc>, threshold: f32) -> Vec<RetrievedDoc> {
    docs.into_iter().filter(|d| d.score > threshold).collect()
}

/// Stable ordering: descending score, ties broken by id ascending
fn order_by_score(mut docs: Vec<RetrievedDoc>) -> Vec<RetrievedDoc> {
    docs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    docs
}
