//! The vector store adapter: single point of contact with the persisted
//! collection of embedded fragments.
//!
//! [`VectorStore`] owns a SQLite pool and an injected
//! [`EmbeddingProvider`]. Ingestion always runs load → chunk → embed before
//! touching the database, then writes fragments and vectors in one
//! transaction, so a fragment never exists without its embedding and a failed
//! ingestion leaves the collection unchanged.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`create`](VectorStore::create) | Ensure the collection exists |
//! | [`add_documents`](VectorStore::add_documents) | Ingest a local file |
//! | [`add_images`](VectorStore::add_images) | Ingest OCR text from an image |
//! | [`add_webpages`](VectorStore::add_webpages) | Fetch and ingest URLs (all or nothing) |
//! | [`query`](VectorStore::query) | Top-`k` fragments by cosine similarity |
//! | [`list_documents`](VectorStore::list_documents) | Every stored fragment |
//! | [`remove_document`](VectorStore::remove_document) | Delete one fragment |
//! | [`clear`](VectorStore::clear) | Delete everything |
//! | [`retriever`](VectorStore::retriever) | Text-only top-`k` view for the answer engine |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::chunk::chunk_text;
use crate::config::{Config, OcrConfig};
use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::loader::{self, WebLoader};
use crate::migrate;
use crate::models::{Chunk, Fragment, IngestOutcome, LoadedItem, ScoredFragment};

const FRAGMENT_COLUMNS: &str = "f.id AS id, f.source AS source, f.title AS title, \
     f.content_type AS content_type, f.chunk_index AS chunk_index, f.text AS text, \
     f.content_hash AS content_hash, f.created_at AS created_at";

#[derive(Clone)]
pub struct VectorStore {
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
    web: WebLoader,
    path: PathBuf,
    max_tokens: usize,
    ocr: OcrConfig,
}

impl VectorStore {
    /// Connect to the collection at `config.store.path`, creating the file
    /// and schema when missing.
    pub async fn open(config: &Config, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let pool = db::connect(&config.store.path).await?;
        migrate::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            embedder,
            web: WebLoader::new()?,
            path: config.store.path.clone(),
            max_tokens: config.chunking.max_tokens,
            ocr: config.ocr.clone(),
        })
    }

    /// Ensure the collection exists on disk and return its location.
    pub async fn create(&self) -> Result<PathBuf> {
        migrate::run_migrations(&self.pool).await?;
        info!(path = %self.path.display(), "vector store ready");
        Ok(self.path.clone())
    }

    pub async fn add_documents(&self, path: &Path) -> Result<IngestOutcome> {
        if !path.exists() {
            return Ok(IngestOutcome::MissingPath);
        }
        let item = loader::load_document(path).await?;
        let fragments = self.ingest(vec![item]).await?;
        info!(source = %path.display(), fragments, "added document");
        Ok(IngestOutcome::Added { fragments })
    }

    pub async fn add_images(&self, path: &Path) -> Result<IngestOutcome> {
        if !path.exists() {
            return Ok(IngestOutcome::MissingPath);
        }
        let item = loader::load_image(&self.ocr, path).await?;
        let fragments = self.ingest(vec![item]).await?;
        info!(source = %path.display(), fragments, "added image");
        Ok(IngestOutcome::Added { fragments })
    }

    /// Fetch every URL and store the pages. Nothing is written unless every
    /// page loads and embeds. Returns the number of fragments stored.
    pub async fn add_webpages(&self, urls: &[String]) -> Result<usize> {
        for url in urls {
            loader::parse_web_url(url)?;
        }

        let mut items = Vec::with_capacity(urls.len());
        for url in urls {
            items.push(self.web.load(url).await?);
        }

        let fragments = self.ingest(items).await?;
        info!(pages = urls.len(), fragments, "added webpages");
        Ok(fragments)
    }

    /// Return up to `k` fragments nearest to `text`, most similar first.
    /// Equal scores keep insertion order.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredFragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {}, v.embedding AS embedding FROM fragments f \
             JOIN fragment_vectors v ON v.fragment_id = f.id \
             ORDER BY f.seq",
            FRAGMENT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        if rows.is_empty() {
            debug!("query against empty collection");
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_query(text).await?;

        let mut scored: Vec<ScoredFragment> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                ScoredFragment {
                    score: cosine_similarity(&query_vec, &blob_to_vec(&blob)),
                    fragment: fragment_from_row(row),
                }
            })
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        debug!(k, hits = scored.len(), "query complete");
        Ok(scored)
    }

    pub async fn list_documents(&self) -> Result<Vec<Fragment>> {
        let sql = format!("SELECT {} FROM fragments f ORDER BY f.seq", FRAGMENT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(fragment_from_row).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fragments")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn remove_document(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM fragment_vectors WHERE fragment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM fragments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RagError::NotFound(id.to_string()));
        }

        tx.commit().await?;
        info!(id, "removed fragment");
        Ok(())
    }

    /// Delete every fragment and embedding. Safe to call on an empty store.
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM fragment_vectors")
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM fragments")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        info!(removed, "cleared vector store");
        Ok(())
    }

    pub fn retriever(&self, k: usize) -> Retriever {
        Retriever {
            store: self.clone(),
            k,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ingest(&self, items: Vec<LoadedItem>) -> Result<usize> {
        let prepared: Vec<(LoadedItem, Vec<Chunk>)> = items
            .into_iter()
            .map(|item| {
                let chunks = chunk_text(&item.body, self.max_tokens);
                (item, chunks)
            })
            .collect();

        let texts: Vec<String> = prepared
            .iter()
            .flat_map(|(_, chunks)| chunks.iter().map(|c| c.text.clone()))
            .collect();
        if texts.is_empty() {
            return Ok(0);
        }

        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Upstream(format!(
                "embedding provider returned {} vectors for {} fragments",
                vectors.len(),
                texts.len()
            )));
        }

        let model = self.embedder.model_name().to_string();
        let now = chrono::Utc::now().timestamp();
        let mut vectors = vectors.into_iter();
        let mut tx = self.pool.begin().await?;

        for (item, chunks) in &prepared {
            for chunk in chunks {
                let Some(vector) = vectors.next() else {
                    break;
                };

                sqlx::query(
                    r#"
                    INSERT INTO fragments (id, source, title, content_type, chunk_index, text, content_hash, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&chunk.id)
                .bind(&item.source)
                .bind(&item.title)
                .bind(&item.content_type)
                .bind(chunk.chunk_index)
                .bind(&chunk.text)
                .bind(&chunk.hash)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    "INSERT INTO fragment_vectors (fragment_id, model, dims, embedding) VALUES (?, ?, ?, ?)",
                )
                .bind(&chunk.id)
                .bind(&model)
                .bind(vector.len() as i64)
                .bind(vec_to_blob(&vector))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(texts.len())
    }
}

fn fragment_from_row(row: &SqliteRow) -> Fragment {
    Fragment {
        id: row.get("id"),
        source: row.get("source"),
        title: row.get("title"),
        content_type: row.get("content_type"),
        chunk_index: row.get("chunk_index"),
        text: row.get("text"),
        content_hash: row.get("content_hash"),
        created_at: row.get("created_at"),
    }
}

/// Text-only top-`k` retrieval over a [`VectorStore`].
#[derive(Clone)]
pub struct Retriever {
    store: VectorStore,
    k: usize,
}

impl Retriever {
    /// Fragment texts for `question`, most relevant first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        let hits = self.store.query(question, self.k).await?;
        Ok(hits.into_iter().map(|h| h.fragment.text).collect())
    }
}
