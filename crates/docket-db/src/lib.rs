//! Docket Database Layer
//!
//! Record store and content index adapters. Both are defined as traits so the lifecycle
//! orchestrator can run against Postgres in production and in-memory stores in tests.

pub mod db;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod traits;

pub use db::{DocumentRepository, PgVectorIndex};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::{InMemoryContentIndex, InMemoryRecordStore};
pub use traits::{ContentIndex, IndexEntry, IndexError, IndexMatch, IndexResult, RecordStore};
