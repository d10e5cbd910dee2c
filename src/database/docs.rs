use pgvector::Vector;
use uuid::Uuid;

use super::Database;
use crate::models::{Document, NewDocument, RetrievedDoc};
use crate::Result;

impl Database {
    /// Nearest-neighbor search over the corpus by cosine distance.
    /// Returns rows with `score = 1 - distance`; threshold filtering is the
    /// retriever's concern.
    pub async fn vector_search_docs(
        &self,
        query_embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<RetrievedDoc>> {
        let embedding = Vector::from(query_embedding.to_vec());

        let docs = sqlx::query_as::<_, RetrievedDoc>(
            r"
            SELECT id, title, content, source_url,
                   (1 - (embedding <=> $1))::float4 AS score
            FROM docs
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1
            LIMIT $2
            ",
        )
        .bind(embedding)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(docs)
    }

    /// Full-text search over title and content, ranked by `ts_rank`.
    pub async fn text_search_docs(&self, query: &str, limit: i64) -> Result<Vec<RetrievedDoc>> {
        let docs = sqlx::query_as::<_, RetrievedDoc>(
            r"
            SELECT id, title, content, source_url,
                   ts_rank(to_tsvector('english', title || ' ' || content),
                           plainto_tsquery('english', $1))::float4 AS score
            FROM docs
            WHERE to_tsvector('english', title || ' ' || content)
                  @@ plainto_tsquery('english', $1)
            ORDER BY score DESC
            LIMIT $2
            ",
        )
        .bind(query)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(docs)
    }

    /// Insert a document, optionally with its embedding.
    pub async fn insert_doc(
        &self,
        doc: &NewDocument,
        embedding: Option<&[f32]>,
    ) -> Result<Uuid> {
        let embedding = embedding.map(|e| Vector::from(e.to_vec()));

        let (id,): (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO docs (title, content, source_url, embedding)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(&doc.source_url)
        .bind(embedding)
        .fetch_one(self.pool())
        .await?;

        Ok(id)
    }

    /// Replace a document's content and embedding in one statement.
    pub async fn update_doc_content(
        &self,
        id: Uuid,
        content: &str,
        embedding: Option<&[f32]>,
    ) -> Result<()> {
        let embedding = embedding.map(|e| Vector::from(e.to_vec()));

        sqlx::query(
            r"
            UPDATE docs
            SET content = $2, embedding = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(content)
        .bind(embedding)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch a single document by id
    pub async fn get_doc(&self, id: Uuid) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM docs WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(doc)
    }

    /// Count documents in the corpus
    pub async fn count_docs(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM docs")
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }
}
