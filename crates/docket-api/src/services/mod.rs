pub mod document_lifecycle;

pub use document_lifecycle::{DocumentLifecycleService, UploadPolicy};
