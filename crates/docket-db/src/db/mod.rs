//! Postgres repositories
//!
//! `DocumentRepository` owns the `documents` table; `PgVectorIndex` owns `document_index`.
//! They take separate pools so the index can live in a different database.

pub mod content_index;
pub mod document;

pub use content_index::PgVectorIndex;
pub use document::DocumentRepository;
