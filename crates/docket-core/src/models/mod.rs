//! Data models for the application
//!
//! Document records and their lifecycle, upload slot requests and credentials,
//! and similarity search DTOs.

mod document;
mod search;
mod upload;

pub use document::*;
pub use search::*;
pub use upload::*;
