//! Retrieval-augmented answering.
//!
//! [`AnswerEngine::ask_question`] runs one sequential pipeline per question:
//!
//! ```text
//! question ─▶ retrieve (top-k) ─▶ format context ─▶ build prompt ─▶ model ─▶ answer
//! ```
//!
//! There is no caching, streaming, or retry; any failure is returned to the
//! caller as-is.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::store::Retriever;

/// Prefix that turns a passage into an explanation request.
pub const EXPLAIN_PREFIX: &str = "Explain the following text: ";

pub struct AnswerEngine {
    retriever: Retriever,
    model: Arc<dyn LanguageModel>,
}

impl AnswerEngine {
    pub fn new(retriever: Retriever, model: Arc<dyn LanguageModel>) -> Self {
        Self { retriever, model }
    }

    pub async fn ask_question(&self, question: &str) -> Result<String> {
        let fragments = self.retriever.retrieve(question).await?;
        let context = format_context(&fragments);
        let prompt = build_prompt(&context, question);

        debug!(
            fragments = fragments.len(),
            model = self.model.model_name(),
            "asking language model"
        );

        let raw = self.model.complete(&prompt).await?;
        Ok(parse_output(raw))
    }

    /// Same pipeline, with the text wrapped in an explanation request.
    pub async fn explain_text(&self, text: &str) -> Result<String> {
        self.ask_question(&explain_question(text)).await
    }
}

pub fn explain_question(text: &str) -> String {
    format!("{}{}", EXPLAIN_PREFIX, text)
}

/// Fragment texts in retrieval order, separated by a blank line.
pub fn format_context(fragments: &[String]) -> String {
    fragments.join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based on the context: {}\n\nQuestion: {}",
        context, question
    )
}

/// The model's output is used verbatim as the answer text.
fn parse_output(raw: String) -> String {
    raw
}
