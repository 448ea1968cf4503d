use async_trait::async_trait;
use docket_core::models::{DocumentRecord, DocumentStatus, DocumentUpdate, NewDocument};
use docket_core::AppError;
use sqlx::{PgPool, Postgres};

use crate::traits::RecordStore;

const DOCUMENT_COLUMNS: &str = "id, filename, storage_key, file_size, status, index_ref, \
                                content_summary, created_at, updated_at";

/// Repository for document records in Postgres
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn current_status(&self, id: i64) -> Result<Option<DocumentStatus>, AppError> {
        let status = sqlx::query_scalar::<Postgres, DocumentStatus>(
            "SELECT status FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }
}

#[async_trait]
impl RecordStore for DocumentRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "documents", db.operation = "insert", storage_key = %new.storage_key))]
    async fn create(&self, new: NewDocument) -> Result<DocumentRecord, AppError> {
        let query = format!(
            "INSERT INTO documents (filename, storage_key, status) VALUES ($1, $2, $3) RETURNING {}",
            DOCUMENT_COLUMNS
        );

        let record = sqlx::query_as::<Postgres, DocumentRecord>(&query)
            .bind(&new.filename)
            .bind(&new.storage_key)
            .bind(DocumentStatus::PreSigned)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(
                    format!("Storage key {} is already in use", new.storage_key),
                ),
                other => AppError::Database(other),
            })?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: i64) -> Result<Option<DocumentRecord>, AppError> {
        let query = format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS);

        let record = sqlx::query_as::<Postgres, DocumentRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", storage_key = %storage_key))]
    async fn find_by_storage_key(
        &self,
        storage_key: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM documents WHERE storage_key = $1",
            DOCUMENT_COLUMNS
        );

        let record = sqlx::query_as::<Postgres, DocumentRecord>(&query)
            .bind(storage_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "documents", db.operation = "update", db.record_id = %id, expected = %expected, next = %update.status))]
    async fn conditional_update(
        &self,
        id: i64,
        expected: DocumentStatus,
        update: DocumentUpdate,
    ) -> Result<DocumentRecord, AppError> {
        if !expected.can_transition_to(update.status) {
            return Err(AppError::Internal(format!(
                "Illegal transition {} -> {}",
                expected, update.status
            )));
        }

        // The status predicate makes this a compare-and-swap; at most one caller wins.
        let query = format!(
            r#"
            UPDATE documents
            SET status = $3,
                index_ref = COALESCE($4, index_ref),
                file_size = COALESCE($5, file_size),
                content_summary = COALESCE($6, content_summary),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        );

        let updated = sqlx::query_as::<Postgres, DocumentRecord>(&query)
            .bind(id)
            .bind(expected)
            .bind(update.status)
            .bind(update.index_ref.as_deref())
            .bind(update.file_size)
            .bind(update.content_summary.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(record) = updated {
            return Ok(record);
        }

        match self.current_status(id).await? {
            None => Err(AppError::NotFound(format!("Document {} not found", id))),
            Some(actual) => Err(AppError::Conflict(format!(
                "Document {} is {}, expected {}",
                id, actual, expected
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "delete", db.record_id = %id, expected = %expected))]
    async fn delete_if(&self, id: i64, expected: DocumentStatus) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.current_status(id).await? {
            None => Err(AppError::NotFound(format!("Document {} not found", id))),
            Some(actual) => Err(AppError::Conflict(format!(
                "Document {} is {}, expected {}",
                id, actual, expected
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.offset = %offset, db.limit = %limit))]
    async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<DocumentRecord>, i64), AppError> {
        let query = format!(
            "SELECT {} FROM documents ORDER BY id ASC LIMIT $1 OFFSET $2",
            DOCUMENT_COLUMNS
        );

        let records = sqlx::query_as::<Postgres, DocumentRecord>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        Ok((records, total))
    }
}
