//! Filename validation for begin-upload
//!
//! Rules:
//! - Trimmed filename must be non-empty and at most 255 characters
//! - No path separators (`/`, `\`) and no control characters
//! - Extension must be in the configured allowlist (empty allowlist allows any)

use crate::constants::MAX_FILENAME_LENGTH;
use crate::error::AppError;

/// Validate a client-supplied filename and return its trimmed form.
pub fn validate_filename(filename: &str, allowed_extensions: &[String]) -> Result<String, AppError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(
            "Filename cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_FILENAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Filename exceeds maximum length of {} characters",
            MAX_FILENAME_LENGTH
        )));
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::InvalidInput(
            "Filename cannot contain path separators".to_string(),
        ));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(AppError::InvalidInput(
            "Filename cannot contain control characters".to_string(),
        ));
    }

    if !allowed_extensions.is_empty() {
        let allowed = document_extension(trimmed)
            .map(|ext| allowed_extensions.iter().any(|a| a == &ext))
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::InvalidInput(format!(
                "File extension not allowed. Allowed extensions: {}",
                allowed_extensions.join(", ")
            )));
        }
    }

    Ok(trimmed.to_string())
}

/// Lowercase extension of a filename, if it has a non-empty one.
///
/// Only ASCII alphanumeric extensions are returned so the value is safe to embed in a storage key.
pub fn document_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> Vec<String> {
        vec!["pdf".to_string(), "txt".to_string(), "md".to_string()]
    }

    #[test]
    fn test_valid_filename_is_trimmed() {
        assert_eq!(
            validate_filename("  report.pdf ", &allowlist()).unwrap(),
            "report.pdf"
        );
    }

    #[test]
    fn test_empty_or_whitespace_rejected() {
        assert!(matches!(
            validate_filename("", &[]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_filename("   ", &[]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = format!("{}.md", "é".repeat(252));
        assert!(validate_filename(&at_limit, &allowlist()).is_ok());
        let over = format!("{}.md", "é".repeat(253));
        assert!(validate_filename(&over, &allowlist()).is_err());
    }

    #[test]
    fn test_path_separators_and_control_chars_rejected() {
        assert!(validate_filename("../etc/passwd.txt", &[]).is_err());
        assert!(validate_filename("dir\\file.txt", &[]).is_err());
        assert!(validate_filename("bad\u{0}name.txt", &[]).is_err());
    }

    #[test]
    fn test_extension_allowlist() {
        assert!(validate_filename("REPORT.PDF", &allowlist()).is_ok());
        assert!(validate_filename("image.png", &allowlist()).is_err());
        assert!(validate_filename("noextension", &allowlist()).is_err());
        assert!(validate_filename("image.png", &[]).is_ok());
    }

    #[test]
    fn test_document_extension() {
        assert_eq!(document_extension("a.PDF").as_deref(), Some("pdf"));
        assert_eq!(document_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(document_extension(".hidden"), None);
        assert_eq!(document_extension("trailing."), None);
        assert_eq!(document_extension("weird.p d f"), None);
    }
}
