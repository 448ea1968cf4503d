use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a document record.
///
/// Status only advances `PreSigned -> Uploaded -> Parsed`; deletion is terminal
/// from any state and is not represented as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum DocumentStatus {
    /// Upload credential issued, bytes not confirmed
    PreSigned,
    /// Client confirmed the direct upload
    Uploaded,
    /// Content extracted and indexed
    Parsed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::PreSigned => "PRE_SIGNED",
            DocumentStatus::Uploaded => "UPLOADED",
            DocumentStatus::Parsed => "PARSED",
        }
    }

    /// Forward edges of the lifecycle. No transition skips a state or regresses.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        matches!(
            (self, next),
            (DocumentStatus::PreSigned, DocumentStatus::Uploaded)
                | (DocumentStatus::Uploaded, DocumentStatus::Parsed)
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub storage_key: String,
    pub file_size: Option<i64>,
    pub status: DocumentStatus,
    pub index_ref: Option<String>,
    pub content_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a record is created at begin-upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub filename: String,
    pub storage_key: String,
}

/// Target state of a conditional update plus the attributes that change with it.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
    pub status: DocumentStatus,
    pub index_ref: Option<String>,
    pub file_size: Option<i64>,
    pub content_summary: Option<String>,
}

impl DocumentUpdate {
    pub fn uploaded() -> Self {
        Self {
            status: DocumentStatus::Uploaded,
            index_ref: None,
            file_size: None,
            content_summary: None,
        }
    }

    pub fn parsed(index_ref: String, file_size: i64, content_summary: String) -> Self {
        Self {
            status: DocumentStatus::Parsed,
            index_ref: Some(index_ref),
            file_size: Some(file_size),
            content_summary: Some(content_summary),
        }
    }

    /// Apply this update to a record, bumping `updated_at`.
    pub fn apply_to(&self, record: &mut DocumentRecord, now: DateTime<Utc>) {
        record.status = self.status;
        if let Some(ref index_ref) = self.index_ref {
            record.index_ref = Some(index_ref.clone());
        }
        if let Some(file_size) = self.file_size {
            record.file_size = Some(file_size);
        }
        if let Some(ref summary) = self.content_summary {
            record.content_summary = Some(summary.clone());
        }
        record.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i64,
    pub filename: String,
    pub storage_key: String,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub status: DocumentStatus,
    pub index_ref: Option<String>,
    pub content_summary: Option<String>,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(doc: DocumentRecord) -> Self {
        DocumentResponse {
            id: doc.id,
            filename: doc.filename,
            storage_key: doc.storage_key,
            file_size: doc.file_size,
            created_at: doc.created_at,
            status: doc.status,
            index_ref: doc.index_ref,
            content_summary: doc.content_summary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total_count: i64,
    pub offset: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: DocumentStatus) -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id: 1,
            filename: "report.pdf".to_string(),
            storage_key: "documents/abc.pdf".to_string(),
            file_size: None,
            status,
            index_ref: None,
            content_summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_transitions_only_move_forward_one_step() {
        use DocumentStatus::*;
        assert!(PreSigned.can_transition_to(Uploaded));
        assert!(Uploaded.can_transition_to(Parsed));
        assert!(!PreSigned.can_transition_to(Parsed));
        assert!(!Parsed.can_transition_to(Uploaded));
        assert!(!Uploaded.can_transition_to(PreSigned));
        assert!(!Uploaded.can_transition_to(Uploaded));
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::PreSigned).unwrap();
        assert_eq!(json, "\"PRE_SIGNED\"");
        let parsed: DocumentStatus = serde_json::from_str("\"PARSED\"").unwrap();
        assert_eq!(parsed, DocumentStatus::Parsed);
    }

    #[test]
    fn test_response_field_names() {
        let value = serde_json::to_value(DocumentResponse::from(record(DocumentStatus::Uploaded)))
            .unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "content_summary",
                "created_at",
                "file_size",
                "filename",
                "id",
                "index_ref",
                "status",
                "storage_key"
            ]
        );
        assert_eq!(value["status"], "UPLOADED");
    }

    #[test]
    fn test_parsed_update_sets_index_fields() {
        let mut doc = record(DocumentStatus::Uploaded);
        let before = doc.updated_at;
        let later = before + chrono::Duration::seconds(5);
        DocumentUpdate::parsed("doc-1".to_string(), 11, "indexed".to_string())
            .apply_to(&mut doc, later);
        assert_eq!(doc.status, DocumentStatus::Parsed);
        assert_eq!(doc.index_ref.as_deref(), Some("doc-1"));
        assert_eq!(doc.file_size, Some(11));
        assert_eq!(doc.updated_at, later);
    }
}
