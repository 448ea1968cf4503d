//! Document lifecycle orchestration across the record store, blob storage, the content
//! pipeline, and the content index.
//!
//! Keeps handler logic thin and allows testing every transition without HTTP. The service
//! holds no locks; same-id transitions are serialized only by the record store's
//! conditional update.

use std::sync::Arc;
use std::time::{Duration, Instant};

use docket_core::constants::{
    index_ref_for, DEFAULT_CONTENT_TYPE, DEFAULT_SEARCH_TOP_K, MAX_SEARCH_TOP_K,
};
use docket_core::models::{
    BeginUploadResponse, DocumentRecord, DocumentStatus, DocumentUpdate, NewDocument,
    SearchResult,
};
use docket_core::validation::validate_filename;
use docket_core::{AppError, Provider};
use docket_db::{ContentIndex, IndexEntry, IndexError, RecordStore};
use docket_processing::{ContentPipeline, DocumentFormat, ExtractedText, PipelineError};
use docket_storage::{generate_storage_key, BlobStorage, StorageError};

/// Characters of indexed text returned with each search match.
const SNIPPET_CHARS: usize = 200;

/// Upload rules applied at begin-upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Lowercase extensions without the dot; empty allows any
    pub allowed_extensions: Vec<String>,
    pub upload_url_expiry: Duration,
    /// Largest object analyze will fetch
    pub max_document_size: u64,
}

/// Drives records through `PRE_SIGNED -> UPLOADED -> PARSED` and removes them again.
pub struct DocumentLifecycleService {
    records: Arc<dyn RecordStore>,
    storage: Arc<dyn BlobStorage>,
    index: Arc<dyn ContentIndex>,
    pipeline: Arc<dyn ContentPipeline>,
    policy: UploadPolicy,
}

fn records_error(err: AppError) -> AppError {
    match err {
        AppError::Database(e) => AppError::provider(Provider::Records, e.to_string()),
        other => other,
    }
}

fn index_error(err: IndexError) -> AppError {
    AppError::provider(Provider::Index, err.to_string())
}

fn pipeline_error(err: PipelineError) -> AppError {
    match err {
        PipelineError::Unprocessable(msg) => AppError::Unprocessable(msg),
        PipelineError::Embedding(msg) => AppError::provider(Provider::Embedding, msg),
    }
}

fn fetch_error(err: StorageError, record: &DocumentRecord) -> AppError {
    match err {
        StorageError::NotFound(_) => {
            tracing::warn!(document_id = record.id, storage_key = %record.storage_key, "Uploaded bytes are missing");
            AppError::SourceMissing(format!(
                "No bytes found at {} for document {}",
                record.storage_key, record.id
            ))
        }
        other => {
            tracing::error!(error = %other, document_id = record.id, "Failed to fetch document bytes");
            AppError::provider(Provider::Blob, other.to_string())
        }
    }
}

fn content_summary(extracted: &ExtractedText, model_name: &str) -> String {
    let kind = match extracted.format {
        DocumentFormat::Pdf => "PDF",
        DocumentFormat::Text => "Text",
    };
    let truncated = if extracted.truncated { " (truncated)" } else { "" };
    format!(
        "{} content extracted ({} characters{}), embedded with {} and indexed for search",
        kind,
        extracted.char_count(),
        truncated,
        model_name
    )
}

fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

impl DocumentLifecycleService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        storage: Arc<dyn BlobStorage>,
        index: Arc<dyn ContentIndex>,
        pipeline: Arc<dyn ContentPipeline>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            records,
            storage,
            index,
            pipeline,
            policy,
        }
    }

    async fn load(&self, id: i64) -> Result<DocumentRecord, AppError> {
        self.records
            .get(id)
            .await
            .map_err(records_error)?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    /// Reserve a storage key, issue a write credential for it, and persist a `PRE_SIGNED`
    /// record. Nothing is persisted if credential issuance fails.
    #[tracing::instrument(skip(self))]
    pub async fn begin_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<BeginUploadResponse, AppError> {
        let filename = validate_filename(filename, &self.policy.allowed_extensions)?;
        let storage_key = generate_storage_key(&filename);
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);

        let credential = self
            .storage
            .issue_write_credential(&storage_key, content_type, self.policy.upload_url_expiry)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, storage_key = %storage_key, "Failed to issue write credential");
                AppError::provider(Provider::Blob, e.to_string())
            })?;

        let record = self
            .records
            .create(NewDocument {
                filename: filename.clone(),
                storage_key: storage_key.clone(),
            })
            .await
            .map_err(|e| {
                // The credential is stateless; nothing to revoke.
                tracing::error!(error = %e, storage_key = %storage_key, "Failed to persist document record");
                records_error(e)
            })?;

        tracing::info!(
            document_id = record.id,
            storage_key = %record.storage_key,
            filename = %record.filename,
            "Upload slot issued"
        );

        Ok(BeginUploadResponse::new(
            record.id,
            record.storage_key,
            credential,
        ))
    }

    /// Mark a record `UPLOADED`. Already `UPLOADED` is a no-op; `PARSED` is a conflict.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_upload(&self, id: i64) -> Result<DocumentRecord, AppError> {
        let record = self.load(id).await?;
        match record.status {
            DocumentStatus::Uploaded => Ok(record),
            DocumentStatus::Parsed => Err(AppError::Conflict(format!(
                "Document {} is already PARSED",
                id
            ))),
            DocumentStatus::PreSigned => {
                let updated = self
                    .records
                    .conditional_update(id, DocumentStatus::PreSigned, DocumentUpdate::uploaded())
                    .await
                    .map_err(records_error)?;
                tracing::info!(document_id = id, "Upload confirmed");
                Ok(updated)
            }
        }
    }

    /// Extract, embed and index an `UPLOADED` document, then mark it `PARSED`.
    ///
    /// The index entry is written before the record is marked `PARSED`, so a `PARSED`
    /// record always has an entry behind its `index_ref`.
    #[tracing::instrument(skip(self))]
    pub async fn analyze(&self, id: i64) -> Result<DocumentRecord, AppError> {
        let record = self.load(id).await?;
        match record.status {
            DocumentStatus::PreSigned => Err(AppError::Conflict(format!(
                "Document {} upload has not been confirmed",
                id
            ))),
            DocumentStatus::Parsed => Ok(record),
            DocumentStatus::Uploaded => self.run_analysis(record).await,
        }
    }

    async fn run_analysis(&self, record: DocumentRecord) -> Result<DocumentRecord, AppError> {
        let start = Instant::now();
        let id = record.id;

        let size = self
            .storage
            .size(&record.storage_key)
            .await
            .map_err(|e| fetch_error(e, &record))?;
        if size > self.policy.max_document_size {
            tracing::warn!(
                document_id = id,
                size_bytes = size,
                max_bytes = self.policy.max_document_size,
                "Uploaded document exceeds size limit"
            );
            return Err(AppError::Unprocessable(format!(
                "Document is {} bytes, larger than the {} byte limit",
                size, self.policy.max_document_size
            )));
        }

        let bytes = self
            .storage
            .fetch(&record.storage_key)
            .await
            .map_err(|e| fetch_error(e, &record))?;
        let file_size = bytes.len() as i64;

        let extracted = self
            .pipeline
            .extract_text(bytes)
            .await
            .map_err(pipeline_error)?;
        let embedding = self
            .pipeline
            .embed(&extracted.text)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, document_id = id, "Embedding failed");
                pipeline_error(e)
            })?;

        let index_ref = index_ref_for(id);
        let model_name = self.pipeline.model_name().to_string();
        let summary = content_summary(&extracted, &model_name);
        let entry = IndexEntry {
            index_ref: index_ref.clone(),
            document_id: id,
            filename: record.filename.clone(),
            content: extracted.text,
            embedding,
            model_name,
            metadata: serde_json::json!({
                "document_id": id,
                "filename": record.filename,
                "storage_key": record.storage_key,
                "file_size": file_size,
            }),
        };
        self.index.upsert(entry).await.map_err(|e| {
            tracing::error!(error = %e, document_id = id, index_ref = %index_ref, "Index upsert failed");
            index_error(e)
        })?;

        let update = DocumentUpdate::parsed(index_ref.clone(), file_size, summary);
        match self
            .records
            .conditional_update(id, DocumentStatus::Uploaded, update)
            .await
        {
            Ok(updated) => {
                tracing::info!(
                    document_id = id,
                    index_ref = %index_ref,
                    file_size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Document analyzed"
                );
                Ok(updated)
            }
            Err(AppError::NotFound(msg)) => {
                // Deleted while analysis ran: drop the entry we just wrote.
                if let Err(e) = self.index.delete(&index_ref).await {
                    tracing::warn!(
                        error = %e,
                        document_id = id,
                        index_ref = %index_ref,
                        "Failed to remove index entry of a deleted document"
                    );
                }
                Err(AppError::NotFound(msg))
            }
            Err(e) => Err(records_error(e)),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<DocumentRecord, AppError> {
        self.load(id).await
    }

    /// Page of records ordered by id, with the total record count.
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<DocumentRecord>, i64), AppError> {
        self.records
            .list(offset, limit)
            .await
            .map_err(records_error)
    }

    /// Remove the index entry, the blob, then the record.
    ///
    /// Satellite removals are each attempted; if any fails the record is kept so the
    /// delete can be retried, and `PartialDeleteFailure` names the stores left behind.
    /// The record is only removed in the status the cleanup saw; if a concurrent
    /// transition moved it on, the cleanup runs again for the new state.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut record = self.load(id).await?;

        loop {
            self.remove_satellites(&record).await?;

            match self.records.delete_if(id, record.status).await {
                // Gone already: a concurrent delete finished first.
                Ok(()) | Err(AppError::NotFound(_)) => {
                    tracing::info!(document_id = id, "Document deleted");
                    return Ok(());
                }
                Err(AppError::Conflict(_)) => {
                    tracing::debug!(
                        document_id = id,
                        seen = %record.status,
                        "Document changed during delete; cleaning up again"
                    );
                    match self.records.get(id).await.map_err(records_error)? {
                        Some(current) => record = current,
                        None => return Ok(()),
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, document_id = id, "Failed to delete document record");
                    return Err(AppError::PartialDeleteFailure {
                        id,
                        uncleaned: vec![Provider::Records],
                    });
                }
            }
        }
    }

    /// Remove the index entry and the blob of `record`, attempting both.
    async fn remove_satellites(&self, record: &DocumentRecord) -> Result<(), AppError> {
        let id = record.id;
        let mut uncleaned = Vec::new();

        // The key is deterministic, so an entry written by an analysis that has not
        // marked the record PARSED yet is removed too.
        let index_ref = record
            .index_ref
            .clone()
            .unwrap_or_else(|| index_ref_for(id));
        if let Err(e) = self.index.delete(&index_ref).await {
            tracing::error!(error = %e, document_id = id, index_ref = %index_ref, "Failed to delete index entry");
            uncleaned.push(Provider::Index);
        }

        if let Err(e) = self.storage.delete(&record.storage_key).await {
            tracing::error!(error = %e, document_id = id, storage_key = %record.storage_key, "Failed to delete blob");
            uncleaned.push(Provider::Blob);
        }

        if uncleaned.is_empty() {
            Ok(())
        } else {
            Err(AppError::PartialDeleteFailure { id, uncleaned })
        }
    }

    /// The `PRE_SIGNED` record that owns `storage_key`, for accepting a direct upload.
    ///
    /// Fails `NotFound` when no record owns the key and `Conflict` once the upload has
    /// been confirmed.
    #[tracing::instrument(skip(self))]
    pub async fn pending_upload(&self, storage_key: &str) -> Result<DocumentRecord, AppError> {
        let record = self
            .records
            .find_by_storage_key(storage_key)
            .await
            .map_err(records_error)?
            .ok_or_else(|| {
                AppError::NotFound(format!("No document owns storage key {}", storage_key))
            })?;

        if record.status != DocumentStatus::PreSigned {
            return Err(AppError::Conflict(format!(
                "Document {} is {}; uploads are only accepted while PRE_SIGNED",
                record.id, record.status
            )));
        }

        Ok(record)
    }

    /// Rank indexed documents by similarity to `query`.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchResult>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        let top_k = top_k
            .unwrap_or(DEFAULT_SEARCH_TOP_K)
            .clamp(1, MAX_SEARCH_TOP_K);

        let vector = self
            .pipeline
            .embed_query(query)
            .await
            .map_err(pipeline_error)?;
        let matches = self
            .index
            .search(vector, top_k)
            .await
            .map_err(index_error)?;

        tracing::debug!(top_k, returned = matches.len(), "Search completed");

        Ok(matches
            .into_iter()
            .map(|m| SearchResult {
                document_id: m.document_id,
                index_ref: m.index_ref,
                filename: m.filename,
                snippet: snippet(&m.content),
                score: m.score,
            })
            .collect())
    }

    /// Cheap record store round trip for readiness probes.
    pub async fn check_records(&self) -> Result<(), AppError> {
        self.records
            .list(0, 1)
            .await
            .map(|_| ())
            .map_err(records_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "é".repeat(SNIPPET_CHARS + 10);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 3);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_pipeline_error_mapping() {
        assert!(matches!(
            pipeline_error(PipelineError::Unprocessable("empty".into())),
            AppError::Unprocessable(_)
        ));
        assert!(matches!(
            pipeline_error(PipelineError::Embedding("down".into())),
            AppError::Provider {
                provider: Provider::Embedding,
                ..
            }
        ));
    }

    #[test]
    fn test_content_summary_mentions_format_and_length() {
        let extracted = ExtractedText {
            text: "hello world".to_string(),
            format: DocumentFormat::Pdf,
            truncated: false,
        };
        let summary = content_summary(&extracted, "voyage-3");
        assert!(summary.starts_with("PDF content extracted (11 characters)"));
        assert!(summary.contains("voyage-3"));
    }
}
