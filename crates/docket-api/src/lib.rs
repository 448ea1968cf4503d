//! Docket API Library
//!
//! HTTP handlers, the document lifecycle orchestrator, and application setup.

mod api_doc;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::{DocumentLifecycleService, UploadPolicy};
pub use state::AppState;
