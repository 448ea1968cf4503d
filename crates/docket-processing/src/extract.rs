//! Text extraction from uploaded document bytes

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::pipeline::{PipelineError, PipelineResult};

/// Maximum characters kept from a document after normalization.
pub const MAX_EXTRACTED_CHARS: usize = 200_000;

/// Detected document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detect format from magic bytes. Anything that is not a PDF is tried as text.
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= 5 && &data[0..5] == b"%PDF-" {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        }
    }
}

/// Normalized text extracted from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
    /// True when the text was cut at `MAX_EXTRACTED_CHARS`
    pub truncated: bool,
}

impl ExtractedText {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract usable text. Fails `PipelineError::Unprocessable` when there is none.
    async fn extract(&self, data: Bytes) -> PipelineResult<ExtractedText>;
}

/// Extractor for PDF and UTF-8 text documents
#[derive(Debug, Clone, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract(&self, data: Bytes) -> PipelineResult<ExtractedText> {
        if data.is_empty() {
            return Err(PipelineError::Unprocessable("Document is empty".to_string()));
        }

        let format = DocumentFormat::detect(&data);
        let raw = match format {
            DocumentFormat::Pdf => extract_pdf_text(data).await?,
            DocumentFormat::Text => decode_text(&data)?,
        };

        let (text, truncated) = normalize_text(&raw, MAX_EXTRACTED_CHARS);
        if text.is_empty() {
            return Err(PipelineError::Unprocessable(
                "Document contains no extractable text".to_string(),
            ));
        }

        tracing::debug!(
            format = ?format,
            text_len = text.len(),
            truncated,
            "Text extracted"
        );

        Ok(ExtractedText {
            text,
            format,
            truncated,
        })
    }
}

fn decode_text(data: &[u8]) -> PipelineResult<String> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    std::str::from_utf8(data)
        .map(str::to_string)
        .map_err(|_| {
            PipelineError::Unprocessable(
                "Unsupported document format: not a PDF and not UTF-8 text".to_string(),
            )
        })
}

#[cfg(feature = "document")]
async fn extract_pdf_text(data: Bytes) -> PipelineResult<String> {
    // pdf-extract is CPU bound and can panic on malformed input. The release profile keeps
    // unwinding so that panic surfaces here as a JoinError.
    let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "PDF text extraction panicked");
            PipelineError::Unprocessable("PDF could not be parsed".to_string())
        })?;

    result.map_err(|e| {
        tracing::warn!(error = %e, "PDF text extraction failed");
        PipelineError::Unprocessable(format!("PDF text extraction failed: {}", e))
    })
}

#[cfg(not(feature = "document"))]
async fn extract_pdf_text(_data: Bytes) -> PipelineResult<String> {
    Err(PipelineError::Unprocessable(
        "PDF extraction requires the document feature".to_string(),
    ))
}

/// Collapse whitespace runs to single spaces (keeping paragraph breaks), drop control
/// characters, trim, and cap the length at `max_chars`.
pub fn normalize_text(raw: &str, max_chars: usize) -> (String, bool) {
    let mut out = String::with_capacity(raw.len().min(max_chars * 4));
    let mut count = 0usize;
    let mut pending_space = false;
    let mut pending_newlines = 0usize;
    let mut truncated = false;

    for c in raw.chars() {
        if c == '\n' {
            pending_newlines += 1;
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }

        if count > 0 {
            let sep = if pending_newlines >= 2 {
                "\n\n"
            } else if pending_newlines == 1 || pending_space {
                " "
            } else {
                ""
            };
            let sep_len = sep.len();
            if count + sep_len + 1 > max_chars {
                truncated = true;
                break;
            }
            out.push_str(sep);
            count += sep_len;
        } else if count + 1 > max_chars {
            truncated = true;
            break;
        }

        out.push(c);
        count += 1;
        pending_space = false;
        pending_newlines = 0;
    }

    (out, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_is_extracted() {
        let extracted = DocumentTextExtractor::new()
            .extract(Bytes::from_static(b"hello world"))
            .await
            .unwrap();
        assert_eq!(extracted.text, "hello world");
        assert_eq!(extracted.format, DocumentFormat::Text);
        assert!(!extracted.truncated);
    }

    #[tokio::test]
    async fn test_utf8_bom_is_stripped() {
        let extracted = DocumentTextExtractor::new()
            .extract(Bytes::from_static(b"\xEF\xBB\xBFnotes"))
            .await
            .unwrap();
        assert_eq!(extracted.text, "notes");
    }

    #[tokio::test]
    async fn test_whitespace_only_is_unprocessable() {
        let err = DocumentTextExtractor::new()
            .extract(Bytes::from_static(b" \n\t \r\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn test_binary_is_unprocessable() {
        let err = DocumentTextExtractor::new()
            .extract(Bytes::from_static(&[0xff, 0xfe, 0x00, 0x81]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unprocessable(_)));
    }

    #[tokio::test]
    async fn test_broken_pdf_is_unprocessable() {
        let err = DocumentTextExtractor::new()
            .extract(Bytes::from_static(b"%PDF-1.4\nnot really a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unprocessable(_)));
    }

    #[cfg(feature = "document")]
    #[tokio::test]
    async fn test_truncated_pdf_is_unprocessable() {
        let mut data = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n3 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>\nendobj\n4 0 obj\n<< /Length 400 >>\nstream\nBT /F1 12 Tf (hel".to_vec();
        data.extend_from_slice(b"\nxref\n0 5\ntrailer\n<< /Root 1 0 R /Size 5 >>\nstartxref\n99999\n%%EO");
        let err = DocumentTextExtractor::new()
            .extract(Bytes::from(data))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unprocessable(_)));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(DocumentFormat::detect(b"%PDF-1.7"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect(b"%PDF"), DocumentFormat::Text);
        assert_eq!(DocumentFormat::detect(b"plain"), DocumentFormat::Text);
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_keeps_paragraphs() {
        let (text, truncated) = normalize_text("  a\t\tb \n c\n\n\nd\u{7}e  ", 100);
        assert_eq!(text, "a b c\n\nde");
        assert!(!truncated);
    }

    #[test]
    fn test_normalize_truncates() {
        let (text, truncated) = normalize_text("abc def", 5);
        assert_eq!(text, "abc d");
        assert!(truncated);
    }
}
