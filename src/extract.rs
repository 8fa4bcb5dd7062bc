//! Text extraction for ingested content.
//!
//! Loaders supply bytes plus a content type; this module returns plain UTF-8
//! text and, for HTML, the page title. Content type is chosen from the file
//! extension for local files and from the response for fetched pages.

use std::path::Path;

use scraper::{Html, Selector};
use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_HTML: &str = "text/html";

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("HTML extraction failed: {0}")]
    Html(String),
}

/// Text pulled out of a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub title: Option<String>,
    pub text: String,
}

/// Picks the extractor for a local document. Anything that is not PDF or
/// HTML is read as plain text.
pub fn content_type_for_path(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("pdf") => MIME_PDF,
        Some("html") | Some("htm") => MIME_HTML,
        _ => MIME_TEXT,
    }
}

/// MIME type recorded for OCR'd images.
pub fn image_content_type(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Strips parameters such as `; charset=utf-8` from a Content-Type header.
pub fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<Extracted, ExtractError> {
    match essence(content_type) {
        MIME_PDF => extract_pdf(bytes),
        MIME_HTML | "application/xhtml+xml" => extract_html(bytes),
        ct if is_textual(ct) => Ok(lossy_text(bytes)),
        other => Err(ExtractError::UnsupportedContentType(other.to_string())),
    }
}

/// `text/*` plus structured formats that are readable as-is (JSON, XML
/// feeds, JavaScript).
fn is_textual(essence: &str) -> bool {
    essence.starts_with("text/")
        || essence.ends_with("/json")
        || essence.ends_with("+json")
        || essence.ends_with("/xml")
        || essence.ends_with("+xml")
        || essence == "application/javascript"
}

/// Body decoded as UTF-8, invalid sequences replaced.
pub fn lossy_text(bytes: &[u8]) -> Extracted {
    Extracted {
        title: None,
        text: String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<Extracted, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(Extracted { title: None, text })
}

fn extract_html(bytes: &[u8]) -> Result<Extracted, ExtractError> {
    let html = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&html);

    let title_selector = Selector::parse("title").map_err(|e| ExtractError::Html(e.to_string()))?;
    let body_selector = Selector::parse("body").map_err(|e| ExtractError::Html(e.to_string()))?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let root = document
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    Ok(Extracted {
        title,
        text: lines.join("\n"),
    })
}
