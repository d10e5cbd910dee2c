//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end pipeline for grounded agricultural question answering:
//! - Vector retrieval over the document corpus with a lexical fallback
//! - Bounded prompt assembly from retrieved passages
//! - Provider-based answer generation with strict schema validation
//! - Deterministic fallback synthesis when generation cannot be trusted
//!
//! # Examples
//!
//! ```rust,no_run
//! use farmguru::config::AppConfig;
//! use farmguru::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config).await?;
//!
//!     let answer = service.answer("When should I irrigate wheat?", 3, "crop").await;
//!     println!("{}", answer.format());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod retriever;

pub use context::PromptBuilder;
pub use pipeline::DegradeReason;
pub use pipeline::RagService;
pub use retriever::Retriever;
