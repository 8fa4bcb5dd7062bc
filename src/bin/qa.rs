//! # rag-qa
//!
//! Asks one question against the vector store and prints the answer.
//!
//! ```bash
//! rag-qa --question "What is the refund policy?"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use rag_chat::config;
use rag_chat::embedding::OpenAIProvider;
use rag_chat::llm::OpenAIChatModel;
use rag_chat::logging;
use rag_chat::qa::AnswerEngine;
use rag_chat::store::VectorStore;

/// Answer a question from the documents in the vector store.
#[derive(Parser)]
#[command(name = "rag-qa", version)]
struct Cli {
    /// Question to ask.
    #[arg(long)]
    question: String,

    /// Path to configuration file (TOML).
    #[arg(long, default_value = "./config/rag.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    let embedder = Arc::new(OpenAIProvider::from_env(&cfg.embedding)?);
    let model = Arc::new(OpenAIChatModel::from_env(&cfg.llm)?);
    let store = VectorStore::open(&cfg, embedder).await?;
    let engine = AnswerEngine::new(store.retriever(cfg.retrieval.k), model);

    let answer = engine.ask_question(&cli.question).await?;
    println!("{}", answer);

    store.close().await;
    Ok(())
}
