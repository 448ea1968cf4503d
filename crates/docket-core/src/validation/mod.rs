//! Validation modules

pub mod filename;

pub use filename::{document_extension, validate_filename};
