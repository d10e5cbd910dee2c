//! Complete pipeline: Retrieve -> Prompt -> Generate -> Validate -> Fallback

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::FarmGuruError;
use crate::errors::Result;
use crate::llm::fallback;
use crate::llm::validator;
use crate::llm::LlmClient;
use crate::llm::Validation;
use crate::models::RetrievedDoc;
use crate::models::StructuredAnswer;
use crate::rag::PromptBuilder;
use crate::rag::Retriever;

/// Why the generation attempt was abandoned in favor of the fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// The provider was unreachable, rate-limited past the retry budget, or
    /// answered with an error
    GenerationUnavailable,
    /// The provider answered, but the payload failed schema validation
    MalformedResponse,
}

/// Outcome of one generation attempt, threaded explicitly between stages so
/// the degrade path is type-checked rather than error-routed.
enum GenerationOutcome {
    Valid(Box<StructuredAnswer>),
    Degraded(DegradeReason),
}

/// Complete question-answering service
pub struct RagService {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    llm_client: LlmClient,
}

impl RagService {
    /// Create a new service from configuration
    ///
    /// # Errors
    /// - Database connection errors
    /// - Embedding or generation client configuration errors
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embedding_service = Arc::new(EmbeddingService::new(config)?);
        let llm_client = LlmClient::new(&config.llm)?;

        Ok(Self::from_services(
            database,
            embedding_service,
            llm_client,
            config.similarity_threshold(),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        database: Arc<Database>,
        embedding_service: Arc<EmbeddingService>,
        llm_client: LlmClient,
        similarity_threshold: f32,
    ) -> Self {
        let retriever = Retriever::new(database, embedding_service, similarity_threshold);

        Self {
            retriever,
            prompt_builder: PromptBuilder::default(),
            llm_client,
        }
    }

    /// Answer a question end to end: retrieve, then synthesize.
    /// Always produces a [`StructuredAnswer`]; every failure mode inside the
    /// pipeline degrades rather than surfaces.
    pub async fn answer(&self, question: &str, limit: usize, agent_hint: &str) -> StructuredAnswer {
        info!("Processing query: {}", question);

        let docs = self.retriever.retrieve(question, limit).await;
        debug!("Retrieved {} documents", docs.len());

        self.synthesize(question, &docs, agent_hint).await
    }

    /// Synthesize an answer from already-retrieved documents.
    ///
    /// State machine: no documents is terminal (zero-confidence "I don't
    /// know"); with documents, one generation attempt is made and either its
    /// validated answer or the deterministic fallback is terminal. The
    /// fallback itself is never retried.
    pub async fn synthesize(
        &self,
        question: &str,
        docs: &[RetrievedDoc],
        agent_hint: &str,
    ) -> StructuredAnswer {
        if docs.is_empty() {
            debug!("No documents retrieved; answering with the sentinel");
            return fallback::synthesize(question, docs, agent_hint);
        }

        match self.attempt_generation(question, docs, agent_hint).await {
            GenerationOutcome::Valid(answer) => {
                debug!("Answer path: generated");
                *answer
            }
            GenerationOutcome::Degraded(reason) => {
                info!("Answer path: deterministic fallback ({reason:?})");
                fallback::synthesize(question, docs, agent_hint)
            }
        }
    }

    async fn attempt_generation(
        &self,
        question: &str,
        docs: &[RetrievedDoc],
        agent_hint: &str,
    ) -> GenerationOutcome {
        let prompt = self.prompt_builder.build(question, docs);

        let raw = match self.llm_client.generate(&prompt).await {
            Ok(raw) => raw,
            Err(FarmGuruError::GenerationUnavailable(reason)) => {
                warn!("Generation unavailable: {reason}");
                return GenerationOutcome::Degraded(DegradeReason::GenerationUnavailable);
            }
            Err(e) => {
                warn!("Generation failed: {e}");
                return GenerationOutcome::Degraded(DegradeReason::GenerationUnavailable);
            }
        };

        match validator::validate(&raw, docs, agent_hint) {
            Validation::Valid(answer) => GenerationOutcome::Valid(answer),
            Validation::Invalid(reason) => {
                warn!("Generation output rejected: {reason}");
                GenerationOutcome::Degraded(DegradeReason::MalformedResponse)
            }
        }
    }

    /// Get retriever reference
    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}
