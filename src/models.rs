//! Core data types that flow between loaders, the vector store, and the
//! façades.

/// Text produced by a loader before chunking.
#[derive(Debug, Clone)]
pub struct LoadedItem {
    /// Path or URL exactly as the caller gave it.
    pub source: String,
    pub title: Option<String>,
    pub content_type: String,
    pub body: String,
}

/// A chunk of a loaded item's body, ready to embed.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub chunk_index: i64,
    pub text: String,
    pub hash: String,
}

/// A fragment as persisted in the vector collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub content_type: String,
    pub chunk_index: i64,
    pub text: String,
    pub content_hash: String,
    pub created_at: i64,
}

/// A fragment returned from a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

/// Result of an ingestion call on a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Added { fragments: usize },
    /// The path did not exist; nothing was read or written.
    MissingPath,
}
