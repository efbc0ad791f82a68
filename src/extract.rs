//! PDF text extraction.
//!
//! Uses pdf-extract for parsing; the result is flattened to one trimmed line per text line.

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
    #[error("PDF extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("transcription returned no text")]
    EmptyTranscript,
}

/// Extract plain text from PDF bytes
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let text = normalize_lines(&raw);
    debug!(raw = raw.len(), normalized = text.len(), "extracted PDF text");
    Ok(text)
}

/// Run [`extract_pdf_text`] on the blocking pool
pub async fn extract_pdf_text_blocking(bytes: Vec<u8>) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes)).await?
}

/// Trim every line and drop the empty ones
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
