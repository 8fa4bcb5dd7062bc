#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rag_chat::config::Config;
use rag_chat::embedding::EmbeddingProvider;
use rag_chat::error::{RagError, Result};
use rag_chat::llm::LanguageModel;
use rag_chat::store::VectorStore;

pub const DIMS: usize = 32;

/// Deterministic bag-of-words embedder: each lowercase word bumps one bucket.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

pub fn embed_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % DIMS;
        v[bucket] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-test"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| embed_words(t)).collect())
    }
}

/// Embedder that always reports the upstream as unavailable.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Upstream("embedding service down".to_string()))
    }
}

/// Language model that records every prompt and answers with a fixed reply.
pub struct RecordingModel {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    fn model_name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::Upstream("chat completion failed: 503".to_string()))
    }
}

pub fn test_config(dir: &Path) -> Config {
    let mut cfg = Config::minimal();
    cfg.store.path = dir.join("store").join("rag.sqlite");
    cfg
}

pub async fn open_store(dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> VectorStore {
    VectorStore::open(&test_config(dir), embedder).await.unwrap()
}
