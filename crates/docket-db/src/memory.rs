//! In-memory record store and content index for tests and local development
//!
//! Mutexes here are std mutexes held only for a map operation, never across an await.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docket_core::models::{DocumentRecord, DocumentStatus, DocumentUpdate, NewDocument};
use docket_core::AppError;

use crate::traits::{ContentIndex, IndexEntry, IndexError, IndexMatch, IndexResult, RecordStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct Records {
    next_id: i64,
    rows: BTreeMap<i64, DocumentRecord>,
}

/// Record store keeping rows in an ordered map
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<Mutex<Records>>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, new: NewDocument) -> Result<DocumentRecord, AppError> {
        let mut records = lock(&self.inner);
        if records.rows.values().any(|r| r.storage_key == new.storage_key) {
            return Err(AppError::Conflict(format!(
                "Storage key {} is already in use",
                new.storage_key
            )));
        }

        records.next_id += 1;
        let now = Utc::now();
        let record = DocumentRecord {
            id: records.next_id,
            filename: new.filename,
            storage_key: new.storage_key,
            file_size: None,
            status: DocumentStatus::PreSigned,
            index_ref: None,
            content_summary: None,
            created_at: now,
            updated_at: now,
        };
        records.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<DocumentRecord>, AppError> {
        Ok(lock(&self.inner).rows.get(&id).cloned())
    }

    async fn find_by_storage_key(
        &self,
        storage_key: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        Ok(lock(&self.inner)
            .rows
            .values()
            .find(|r| r.storage_key == storage_key)
            .cloned())
    }

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

        let mut records = lock(&self.inner);
        let record = records
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        if record.status != expected {
            return Err(AppError::Conflict(format!(
                "Document {} is {}, expected {}",
                id, record.status, expected
            )));
        }

        update.apply_to(record, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "injected record delete failure".to_string(),
            ));
        }
        lock(&self.inner)
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    async fn delete_if(&self, id: i64, expected: DocumentStatus) -> Result<(), AppError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "injected record delete failure".to_string(),
            ));
        }
        let mut records = lock(&self.inner);
        let actual = records
            .rows
            .get(&id)
            .map(|r| r.status)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;
        if actual != expected {
            return Err(AppError::Conflict(format!(
                "Document {} is {}, expected {}",
                id, actual, expected
            )));
        }
        records.rows.remove(&id);
        Ok(())
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<DocumentRecord>, i64), AppError> {
        let records = lock(&self.inner);
        let page = records
            .rows
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, records.rows.len() as i64))
    }
}

#[derive(Clone)]
struct StoredEntry {
    entry: IndexEntry,
    updated_at: DateTime<Utc>,
}

/// Content index doing brute-force cosine similarity over a map
#[derive(Clone, Default)]
pub struct InMemoryContentIndex {
    entries: Arc<Mutex<HashMap<String, StoredEntry>>>,
    fail_upserts: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl InMemoryContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry stored under `index_ref` (for test assertions)
    pub fn entry(&self, index_ref: &str) -> Option<IndexEntry> {
        lock(&self.entries).get(index_ref).map(|s| s.entry.clone())
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl ContentIndex for InMemoryContentIndex {
    async fn upsert(&self, entry: IndexEntry) -> IndexResult<()> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(IndexError::Backend("injected upsert failure".to_string()));
        }
        lock(&self.entries).insert(
            entry.index_ref.clone(),
            StoredEntry {
                entry,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, index_ref: &str) -> IndexResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(IndexError::Backend("injected delete failure".to_string()));
        }
        lock(&self.entries).remove(index_ref);
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, top_k: usize) -> IndexResult<Vec<IndexMatch>> {
        let entries = lock(&self.entries);
        let mut matches: Vec<IndexMatch> = entries
            .values()
            .map(|stored| IndexMatch {
                index_ref: stored.entry.index_ref.clone(),
                document_id: stored.entry.document_id,
                filename: stored.entry.filename.clone(),
                content: stored.entry.content.clone(),
                score: cosine_similarity(&vector, &stored.entry.embedding),
                indexed_at: stored.updated_at,
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn contains(&self, index_ref: &str) -> IndexResult<bool> {
        Ok(lock(&self.entries).contains_key(index_ref))
    }
}
