//! Error taxonomy shared by the store, the answer engine, and the façades.
//!
//! The HTTP layer maps each variant to its own status code; see
//! [`crate::server`].

use thiserror::Error;

use crate::extract::ExtractError;

pub type Result<T, E = RagError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RagError {
    /// Caller-supplied input was rejected before any external call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored fragment with the given identifier does not exist.
    #[error("fragment not found: {0}")]
    NotFound(String),

    /// An external collaborator failed: embedding API, chat API, page
    /// fetch, or the OCR process.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Upstream(format!("{}: {}", context, err))
    }

    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream_unavailable",
            Self::Extract(_) | Self::Storage(_) | Self::Io(_) | Self::Config(_) => "internal",
        }
    }
}
