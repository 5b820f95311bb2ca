// src/services/ingestor.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::{config::PDF_MEDIA_TYPE, error::AppError};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A document opened by a `TextExtractor`, read one page at a time.
pub trait PagedDocument {
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, String>;
}

/// External text extraction capability.
pub trait TextExtractor: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PagedDocument>, String>;
}

/// `TextExtractor` backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

struct LopdfDocument {
    document: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl TextExtractor for LopdfExtractor {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PagedDocument>, String> {
        let document = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
        // `get_pages` is keyed by 1-based page number, in document order.
        let page_numbers = document.get_pages().keys().copied().collect();
        Ok(Box::new(LopdfDocument {
            document,
            page_numbers,
        }))
    }
}

impl PagedDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, String> {
        let page = self
            .page_numbers
            .get(index)
            .ok_or_else(|| format!("page index {} out of range", index))?;
        self.document
            .extract_text(&[*page])
            .map_err(|e| format!("page {}: {}", page, e))
    }
}

/// Text pulled out of an uploaded document.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub file_name: Option<String>,
    pub text: String,
    pub page_count: usize,
}

impl IngestedDocument {
    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Validates the declared media type, then extracts every page in order.
///
/// Page texts are whitespace-normalized and joined with a single space.
/// CPU-bound: call it from the blocking pool.
pub fn ingest(
    extractor: &dyn TextExtractor,
    file_name: Option<String>,
    declared_type: Option<&str>,
    bytes: &[u8],
) -> Result<IngestedDocument, AppError> {
    let declared_type = declared_type.unwrap_or_default();
    if !is_pdf_media_type(declared_type) {
        return Err(AppError::UnsupportedFileType(declared_type.to_string()));
    }

    let document = extractor.open(bytes).map_err(AppError::ExtractionFailed)?;
    let page_count = document.page_count();

    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let raw = document.page_text(index).map_err(AppError::ExtractionFailed)?;
        pages.push(WHITESPACE.replace_all(raw.trim(), " ").into_owned());
    }

    let text = pages.join(" ").trim().to_string();
    if text.is_empty() {
        return Err(AppError::NoExtractableText);
    }

    tracing::debug!(
        "Extracted {} characters from {} pages",
        text.chars().count(),
        page_count
    );

    Ok(IngestedDocument {
        file_name,
        text,
        page_count,
    })
}

/// Accepts `application/pdf`, ignoring case and parameters.
fn is_pdf_media_type(declared: &str) -> bool {
    declared
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
        .unwrap_or(false)
}
