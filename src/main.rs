//! # rag CLI
//!
//! Manages the vector store from the command line.
//!
//! ## Usage
//!
//! ```bash
//! rag --config ./config/rag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rag create` | Create the vector store and its schema |
//! | `rag add <file_path>` | Ingest a PDF, HTML, or text file |
//! | `rag add_image <image_path>` | Ingest OCR text from an image |
//! | `rag query "<text>"` | Show the nearest fragments |
//! | `rag list` | List every stored fragment |
//! | `rag remove <doc_id>` | Delete one fragment |
//! | `rag clear` | Delete every fragment |
//! | `rag add_webpages <url,url,...>` | Fetch and ingest webpages |
//!
//! Questions are asked with the separate `rag-qa` binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use rag_chat::config::{self, Config};
use rag_chat::embedding::OpenAIProvider;
use rag_chat::logging;
use rag_chat::models::IngestOutcome;
use rag_chat::store::VectorStore;

const LIST_PREVIEW_CHARS: usize = 100;
const LIST_SEPARATOR: &str = "\n-----------------------------------\n";

/// Manage the local vector store used for question answering.
#[derive(Parser)]
#[command(name = "rag", version, about = "Manage the local RAG vector store")]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/rag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vector store.
    Create,

    /// Add a document (PDF, HTML, or text) to the vector store.
    Add {
        /// Path to the document.
        file_path: PathBuf,
    },

    /// Add the OCR text of an image to the vector store.
    #[command(name = "add_image")]
    AddImage {
        /// Path to the image.
        image_path: PathBuf,
    },

    /// Query the vector store for the nearest fragments.
    Query {
        /// The query text.
        query_text: String,

        /// Number of fragments to return. Defaults to `[retrieval] k`.
        #[arg(long)]
        k: Option<usize>,
    },

    /// List every fragment in the vector store.
    List,

    /// Remove a fragment by ID.
    Remove {
        /// Fragment ID as printed by `list`.
        doc_id: String,
    },

    /// Remove every fragment from the vector store.
    Clear,

    /// Fetch webpages and add them to the vector store.
    #[command(name = "add_webpages")]
    AddWebpages {
        /// Comma-separated list of URLs.
        urls: String,
    },
}

async fn open_store(cfg: &Config) -> anyhow::Result<VectorStore> {
    let embedder = Arc::new(OpenAIProvider::from_env(&cfg.embedding)?);
    Ok(VectorStore::open(cfg, embedder).await?)
}

fn split_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

fn preview(text: &str) -> String {
    text.chars().take(LIST_PREVIEW_CHARS).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;
    let store = open_store(&cfg).await?;

    match cli.command {
        Commands::Create => {
            let path = store.create().await?;
            println!("Vector store created at '{}'", path.display());
        }
        Commands::Add { file_path } => match store.add_documents(&file_path).await? {
            IngestOutcome::Added { .. } => println!(
                "Added documents from '{}' to the vector store.",
                file_path.display()
            ),
            IngestOutcome::MissingPath => {
                println!("File '{}' does not exist.", file_path.display())
            }
        },
        Commands::AddImage { image_path } => match store.add_images(&image_path).await? {
            IngestOutcome::Added { .. } => println!(
                "Added images from '{}' to the vector store.",
                image_path.display()
            ),
            IngestOutcome::MissingPath => {
                println!("Image file '{}' does not exist.", image_path.display())
            }
        },
        Commands::Query { query_text, k } => {
            let k = k.unwrap_or(cfg.retrieval.k);
            for hit in store.query(&query_text, k).await? {
                println!("Document ID: {}", hit.fragment.source);
                println!("Content: {}\n", hit.fragment.text);
            }
        }
        Commands::List => {
            let fragments = store.list_documents().await?;
            if fragments.is_empty() {
                println!("No documents found.");
            }
            for fragment in fragments {
                println!("Document ID: {}", fragment.id);
                println!("Document: {}", preview(&fragment.text));
                println!("{}", LIST_SEPARATOR);
            }
        }
        Commands::Remove { doc_id } => {
            store.remove_document(&doc_id).await?;
            println!(
                "Removed document with ID '{}' from the vector store.",
                doc_id
            );
        }
        Commands::Clear => {
            store.clear().await?;
            println!("Vector store cleared. All documents have been removed.");
        }
        Commands::AddWebpages { urls } => {
            let urls = split_urls(&urls);
            store.add_webpages(&urls).await?;
            println!("Added webpages from {:?} to the vector store.", urls);
        }
    }

    store.close().await;
    Ok(())
}
