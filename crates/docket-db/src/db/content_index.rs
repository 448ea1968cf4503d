use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{PgPool, Row};

use crate::traits::{ContentIndex, IndexEntry, IndexError, IndexMatch, IndexResult};

/// Content index backed by a pgvector table
#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
    dimension: usize,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    fn check_dimension(&self, vector: &[f32]) -> IndexResult<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentIndex for PgVectorIndex {
    #[tracing::instrument(skip(self, entry), fields(db.table = "document_index", db.operation = "upsert", index_ref = %entry.index_ref, document_id = entry.document_id))]
    async fn upsert(&self, entry: IndexEntry) -> IndexResult<()> {
        self.check_dimension(&entry.embedding)?;
        let vector = Vector::from(entry.embedding);

        sqlx::query(
            r#"
            INSERT INTO document_index (
                index_ref, document_id, filename, content, embedding, model_name, metadata,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (index_ref)
            DO UPDATE SET
                document_id = EXCLUDED.document_id,
                filename = EXCLUDED.filename,
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding,
                model_name = EXCLUDED.model_name,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            "#,
        )
        .bind(&entry.index_ref)
        .bind(entry.document_id)
        .bind(&entry.filename)
        .bind(&entry.content)
        .bind(vector)
        .bind(&entry.model_name)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_index", db.operation = "delete"))]
    async fn delete(&self, index_ref: &str) -> IndexResult<()> {
        sqlx::query("DELETE FROM document_index WHERE index_ref = $1")
            .bind(index_ref)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, vector), fields(db.table = "document_index", db.operation = "vector_search", db.limit = top_k))]
    async fn search(&self, vector: Vec<f32>, top_k: usize) -> IndexResult<Vec<IndexMatch>> {
        self.check_dimension(&vector)?;
        let vector = Vector::from(vector);

        let rows = sqlx::query(
            r#"
            SELECT
                index_ref,
                document_id,
                filename,
                content,
                (1 - (embedding <=> $1))::float4 AS score,
                updated_at
            FROM document_index
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
        )
        .bind(vector)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> IndexResult<IndexMatch> {
                Ok(IndexMatch {
                    index_ref: row.try_get("index_ref")?,
                    document_id: row.try_get("document_id")?,
                    filename: row.try_get("filename")?,
                    content: row.try_get("content")?,
                    score: row.try_get("score")?,
                    indexed_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_index", db.operation = "select"))]
    async fn contains(&self, index_ref: &str) -> IndexResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM document_index WHERE index_ref = $1)",
        )
        .bind(index_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_dimension_checked_before_query() {
        // Lazy pool never connects; the dimension check must fail first.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unused")
            .unwrap();
        let index = PgVectorIndex::new(pool, 4);

        let err = index.search(vec![0.0; 3], 5).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }
}
