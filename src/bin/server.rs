//! # rag-server
//!
//! Serves the HTTP API on `[server] bind` (default `0.0.0.0:5000`).

use std::path::PathBuf;

use clap::Parser;

use rag_chat::{config, logging, server};

#[derive(Parser)]
#[command(name = "rag-server", version, about = "Serve the RAG chat HTTP API")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, default_value = "./config/rag.toml")]
    config: PathBuf,

    /// Override `[server] bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(bind) = cli.bind {
        cfg.server.bind = bind;
    }

    server::run_server(&cfg).await
}
