//! Application-wide constants.

/// Prefix for every blob key issued by the service: `documents/{uuid}.{ext}`.
pub const STORAGE_KEY_PREFIX: &str = "documents";

/// Prefix of the deterministic content index key: `doc-{id}`.
pub const INDEX_REF_PREFIX: &str = "doc-";

/// Maximum filename length accepted at begin-upload (matches the `documents.filename` column).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Extension used for storage keys when the filename has none.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Content type assumed for direct uploads when the client does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// List pagination bounds.
pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Similarity search bounds.
pub const DEFAULT_SEARCH_TOP_K: usize = 5;
pub const MAX_SEARCH_TOP_K: usize = 50;

/// Build the content index key for a document record.
pub fn index_ref_for(document_id: i64) -> String {
    format!("{}{}", INDEX_REF_PREFIX, document_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_ref_is_deterministic() {
        assert_eq!(index_ref_for(1), "doc-1");
        assert_eq!(index_ref_for(42), index_ref_for(42));
    }
}
