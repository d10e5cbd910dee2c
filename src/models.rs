use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A corpus document. Created at ingestion time; the embedding is regenerated
/// whenever the content changes. A NULL embedding (or one produced under a
/// different backend) keeps the row out of vector search; full-text search
/// still reaches it.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ingestion request shape: what an external collaborator hands us when
/// adding to the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
}

/// A retrieval candidate. `score` is cosine similarity on the vector path and
/// a full-text rank on the lexical path; the two are not comparable.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RetrievedDoc {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub score: f32,
}

/// A cited source in an answer. Snippets are bounded to 150 characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Answer metadata. Always derived server-side, never taken from the
/// generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMeta {
    pub agent: String,
    pub retrieved_ids: Vec<Uuid>,
}

/// The single answer shape returned to callers. Every path through the
/// pipeline (generated, fallback, no documents, provider down) produces one
/// of these: `confidence` in [0, 1], 1-3 `actions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub answer: String,
    pub confidence: f64,
    pub actions: Vec<String>,
    pub sources: Vec<Source>,
    pub meta: AnswerMeta,
}

impl StructuredAnswer {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Answer:\n{}\n\n", self.answer));
        output.push_str(&format!("Confidence: {:.2}\n\n", self.confidence));

        output.push_str("Actions:\n");
        for (idx, action) in self.actions.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", idx + 1, action));
        }

        if !self.sources.is_empty() {
            output.push_str(&format!("\nSources ({}):\n", self.sources.len()));
            for source in &self.sources {
                output.push_str(&format!("  - {} ({})\n", source.title, source.url));
            }
        }

        output
    }
}
