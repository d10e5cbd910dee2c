use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use farmguru::config::AppConfig;
use farmguru::database::Database;
use farmguru::embeddings::EmbeddingService;
use farmguru::llm::LlmClient;
use farmguru::models::NewDocument;
use farmguru::rag::RagService;
use farmguru::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "farmguru")]
#[command(about = "FarmGuru CLI for grounded agricultural question answering")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question against the corpus
    Ask {
        /// The question to answer
        question: String,
        /// Maximum number of documents to retrieve (defaults to the
        /// configured retrieval limit)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Agent hint recorded in the answer metadata
        #[arg(long, default_value = "general")]
        agent: String,
        /// Print the raw JSON answer instead of the formatted one
        #[arg(long)]
        json: bool,
    },
    /// Add a document to the corpus
    AddDoc {
        /// Document title
        title: String,
        /// Document content
        content: String,
        /// Source URL for citation
        #[arg(long)]
        url: Option<String>,
    },
    /// Retrieve documents without generating an answer
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        farmguru::logging::init_logging_with_level("debug")?;
    } else {
        farmguru::logging::init_logging()?;
    }

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    if let Commands::Config = cli.command {
        return handle_config_command(&config);
    }

    // Create database connection and initialize schema
    let database = Arc::new(Database::from_config(&config).await?);
    database.init_schema().await?;

    let embedding_service = Arc::new(EmbeddingService::new(&config)?);
    let llm_client = LlmClient::new(&config.llm)?;
    let service = RagService::from_services(
        database,
        embedding_service,
        llm_client,
        config.similarity_threshold(),
    );

    match cli.command {
        Commands::Ask {
            question,
            limit,
            agent,
            json,
        } => {
            let limit = limit.unwrap_or_else(|| config.default_retrieval_limit());
            handle_ask_command(&service, &question, limit, &agent, json).await?;
        }
        Commands::AddDoc {
            title,
            content,
            url,
        } => handle_add_doc_command(&service, title, content, url).await?,
        Commands::Search { query, limit } => handle_search_command(&service, &query, limit).await,
        Commands::Config => unreachable!("handled above"),
    }

    Ok(())
}

async fn handle_ask_command(
    service: &RagService,
    question: &str,
    limit: usize,
    agent: &str,
    json: bool,
) -> Result<()> {
    let answer = service.answer(question, limit, agent).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.format());
    }

    Ok(())
}

async fn handle_add_doc_command(
    service: &RagService,
    title: String,
    content: String,
    url: Option<String>,
) -> Result<()> {
    let doc = NewDocument {
        title,
        content,
        source_url: url,
    };
    let id = service.retriever().add_document(&doc).await?;
    println!("Added document {id}");
    Ok(())
}

async fn handle_search_command(service: &RagService, query: &str, limit: usize) {
    let docs = service.retriever().retrieve(query, limit).await;
    println!("Found {} documents:", docs.len());
    for (idx, doc) in docs.iter().enumerate() {
        println!(
            "  {}. {} (score: {:.3})",
            idx + 1,
            doc.title,
            doc.score
        );
        if let Some(url) = &doc.source_url {
            println!("     {url}");
        }
    }
}

fn handle_config_command(config: &AppConfig) -> Result<()> {
    println!("FarmGuru configuration:");
    println!();
    println!("Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!();
    println!("Embeddings:");
    println!(
        "  Remote backend: {}",
        if config.embeddings.openai_api_key.trim().is_empty() {
            "disabled (no API key)"
        } else {
            "enabled"
        }
    );
    println!("  Remote model: {}", config.embeddings.openai_model);
    println!("  Local backend enabled: {}", config.embeddings.ollama_enabled);
    println!("  Local model: {}", config.embeddings.ollama_model);
    println!();
    println!("Retrieval:");
    println!("  Similarity threshold: {}", config.similarity_threshold());
    println!("  Default limit: {}", config.default_retrieval_limit());
    println!();
    println!("Generation:");
    println!("  Model: {}", config.llm.model);
    println!("  Max attempts: {}", config.llm.max_attempts);
    println!("  Request timeout: {}s", config.llm.request_timeout_secs);

    Ok(())
}

/// Mask database URL for display (hide credentials)
fn mask_database_url(url: &str) -> String {
    match url.rsplit_once('@') {
        Some((_, host)) => format!("postgresql://***@{host}"),
        None => url.to_string(),
    }
}
