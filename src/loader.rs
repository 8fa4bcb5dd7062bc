//! Loaders turn a caller-supplied source (file path, image path, URL) into a
//! [`LoadedItem`] of plain text.
//!
//! | Loader | Source | Extraction |
//! |--------|--------|------------|
//! | [`load_document`] | local file | by extension: PDF, HTML, else plain text |
//! | [`load_image`] | local image | external OCR process (`tesseract` by default) |
//! | [`WebLoader`] | `http`/`https` URL | GET, then HTML/text by response type |
//!
//! Existence checks for local paths belong to the caller
//! ([`VectorStore`](crate::store::VectorStore)); a missing file reaching a
//! loader is an I/O error.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tokio::process::Command;
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{RagError, Result};
use crate::extract::{self, ExtractError, MIME_HTML};
use crate::models::LoadedItem;

pub async fn load_document(path: &Path) -> Result<LoadedItem> {
    let bytes = tokio::fs::read(path).await?;
    let content_type = extract::content_type_for_path(path);
    let extracted = extract::extract_text(&bytes, content_type)?;

    Ok(LoadedItem {
        source: path.display().to_string(),
        title: extracted.title.or_else(|| file_name(path)),
        content_type: content_type.to_string(),
        body: extracted.text,
    })
}

pub async fn load_image(ocr: &OcrConfig, path: &Path) -> Result<LoadedItem> {
    debug!(command = %ocr.command, path = %path.display(), "running OCR");

    let output = Command::new(&ocr.command)
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(&ocr.language)
        .output()
        .await
        .map_err(|e| RagError::upstream(&format!("failed to run '{}'", ocr.command), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RagError::upstream(
            &format!("'{}' exited with {}", ocr.command, output.status),
            stderr.trim(),
        ));
    }

    Ok(LoadedItem {
        source: path.display().to_string(),
        title: file_name(path),
        content_type: extract::image_content_type(path).to_string(),
        body: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Validates that `raw` is an absolute `http`/`https` URL.
pub fn parse_web_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| RagError::InvalidInput(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RagError::InvalidInput(format!(
            "unsupported URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}

/// Fetches webpages over HTTP and extracts their text.
#[derive(Clone)]
pub struct WebLoader {
    client: reqwest::Client,
}

impl WebLoader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rag-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagError::Config(format!("web client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch one page. The source is the URL as given, minus surrounding
    /// whitespace.
    pub async fn load(&self, raw_url: &str) -> Result<LoadedItem> {
        let url = parse_web_url(raw_url)?;
        debug!(%url, "fetching webpage");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RagError::upstream(&format!("fetching {}", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::Upstream(format!(
                "fetching {}: HTTP {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| extract::essence(v).to_string())
            .unwrap_or_else(|| MIME_HTML.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RagError::upstream(&format!("reading {}", url), e))?;
        // A fetched page is stored whatever it is served as; unknown types
        // are read as text.
        let extracted = match extract::extract_text(&bytes, &content_type) {
            Err(ExtractError::UnsupportedContentType(ct)) => {
                debug!(%url, content_type = %ct, "reading response body as text");
                extract::lossy_text(&bytes)
            }
            other => other?,
        };

        Ok(LoadedItem {
            source: raw_url.trim().to_string(),
            title: extracted.title,
            content_type,
            body: extracted.text,
        })
    }
}
