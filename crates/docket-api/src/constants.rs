//! API constants

/// API version segment
pub const API_VERSION: &str = "v1";

/// Versioned prefix for every document route
pub const API_PREFIX: &str = "/api/v1";

/// Path the OpenAPI document is served at
pub const OPENAPI_PATH: &str = "/api/openapi.json";
