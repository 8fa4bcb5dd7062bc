//! # rag-chat
//!
//! Retrieval-augmented question answering over a local vector store.
//!
//! Documents, OCR'd images, and webpages are split into fragments, embedded,
//! and persisted in SQLite. Questions are answered by retrieving the nearest
//! fragments and handing them to a language model as context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │   Loaders   │──▶│ Chunk+Embed │──▶│  SQLite  │
//! │ File/OCR/Web│   │             │   │ fragments│
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │ top-k
//!                                    ┌─────▼──────┐
//!                                    │AnswerEngine│──▶ LLM
//!                                    └─────┬──────┘
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │(rag, qa) │       │  server  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! rag create
//! rag add ./notes/handbook.pdf
//! rag add_webpages https://example.com/a,https://example.com/b
//! rag-qa --question "What does the handbook say about leave?"
//! rag-server                     # POST /chat, /add_webpage, ...
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction from PDF, HTML, and plain text |
//! | [`loader`] | File, image (OCR), and webpage loaders |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Language-model abstraction |
//! | [`store`] | Vector store adapter and retriever |
//! | [`qa`] | Answer engine |
//! | [`server`] | HTTP façade |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`logging`] | Tracing subscriber setup |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod qa;
pub mod server;
pub mod store;
