//! Configuration module
//!
//! Environment-driven configuration for the API server: HTTP, database pools,
//! blob storage, upload policy, and the embedding provider used by the content pipeline.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const UPLOAD_URL_EXPIRY_SECS: u64 = 3600;
const MAX_DOCUMENT_SIZE_MB: usize = 50;
const DOCUMENT_ALLOWED_EXTENSIONS: &str = "pdf,txt,md";
const EMBEDDING_PROVIDER: &str = "voyage";
const VOYAGE_EMBEDDING_MODEL: &str = "voyage-3";
const EMBEDDING_DIM: usize = 384;
const EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Base configuration for the HTTP server
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Document service configuration
#[derive(Clone, Debug)]
pub struct DocketConfig {
    pub base: BaseConfig,
    pub database_url: String,
    /// Content index database; defaults to `database_url`
    pub index_database_url: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload policy
    pub upload_url_expiry_secs: u64,
    pub max_document_size_bytes: usize,
    /// Lowercase extensions without the dot; empty allows any
    pub document_allowed_extensions: Vec<String>,
    // Content pipeline
    pub embedding_provider: String,
    pub voyage_api_key: Option<String>,
    pub voyage_embedding_model: String,
    pub embedding_dim: usize,
    pub embedding_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<DocketConfig>);

impl Config {
    fn inner(&self) -> &DocketConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = DocketConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn index_database_url(&self) -> &str {
        &self.inner().index_database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend.unwrap_or(StorageBackend::S3)
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    /// `S3_REGION`, falling back to `AWS_REGION`
    pub fn s3_region(&self) -> Option<&str> {
        self.inner()
            .s3_region
            .as_deref()
            .or(self.inner().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn upload_url_expiry_secs(&self) -> u64 {
        self.inner().upload_url_expiry_secs
    }

    pub fn max_document_size_bytes(&self) -> usize {
        self.inner().max_document_size_bytes
    }

    pub fn document_allowed_extensions(&self) -> &[String] {
        &self.inner().document_allowed_extensions
    }

    pub fn embedding_provider(&self) -> &str {
        &self.inner().embedding_provider
    }

    pub fn voyage_api_key(&self) -> Option<&str> {
        self.inner().voyage_api_key.as_deref()
    }

    pub fn voyage_embedding_model(&self) -> &str {
        &self.inner().voyage_embedding_model
    }

    pub fn embedding_dim(&self) -> usize {
        self.inner().embedding_dim
    }

    pub fn embedding_timeout_secs(&self) -> u64 {
        self.inner().embedding_timeout_secs
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl DocketConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => Some(raw.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let index_database_url =
            env::var("INDEX_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

        let config = DocketConfig {
            base,
            database_url,
            index_database_url,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload_url_expiry_secs: env_or("UPLOAD_URL_EXPIRY_SECS", UPLOAD_URL_EXPIRY_SECS),
            max_document_size_bytes: env_or("MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB)
                * 1024
                * 1024,
            document_allowed_extensions: parse_list(
                &env::var("DOCUMENT_ALLOWED_EXTENSIONS")
                    .unwrap_or_else(|_| DOCUMENT_ALLOWED_EXTENSIONS.to_string()),
            ),
            embedding_provider: env::var("EMBEDDING_PROVIDER")
                .unwrap_or_else(|_| EMBEDDING_PROVIDER.to_string())
                .to_lowercase(),
            voyage_api_key: env::var("VOYAGE_API_KEY").ok().filter(|k| !k.is_empty()),
            voyage_embedding_model: env::var("VOYAGE_EMBEDDING_MODEL")
                .unwrap_or_else(|_| VOYAGE_EMBEDDING_MODEL.to_string()),
            embedding_dim: env_or("EMBEDDING_DIM", EMBEDDING_DIM),
            embedding_timeout_secs: env_or("EMBEDDING_TIMEOUT_SECS", EMBEDDING_TIMEOUT_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("DATABASE_URL", &self.database_url),
            ("INDEX_DATABASE_URL", &self.index_database_url),
        ] {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "{} must be a valid PostgreSQL connection string",
                    name
                ));
            }
        }

        if self.upload_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_URL_EXPIRY_SECS must be greater than zero"
            ));
        }

        if self.embedding_dim == 0 {
            return Err(anyhow::anyhow!("EMBEDDING_DIM must be greater than zero"));
        }

        match self.embedding_provider.as_str() {
            "voyage" => {
                if self.voyage_api_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "VOYAGE_API_KEY must be set when EMBEDDING_PROVIDER=voyage"
                    ));
                }
            }
            "hashing" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "EMBEDDING_PROVIDER must be 'voyage' or 'hashing', got '{}'",
                    other
                ));
            }
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.base.environment.to_lowercase().starts_with("prod") {
                    return Err(anyhow::anyhow!(
                        "memory storage backend cannot be used in production"
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Default for DocketConfig {
    /// Development defaults: local storage under `./data`, hashing embedder.
    fn default() -> Self {
        DocketConfig {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                environment: "development".to_string(),
            },
            database_url: "postgresql://localhost/docket".to_string(),
            index_database_url: "postgresql://localhost/docket".to_string(),
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("./data".to_string()),
            local_storage_base_url: Some(format!("http://localhost:{}/api/v1/blobs", SERVER_PORT)),
            upload_url_expiry_secs: UPLOAD_URL_EXPIRY_SECS,
            max_document_size_bytes: MAX_DOCUMENT_SIZE_MB * 1024 * 1024,
            document_allowed_extensions: parse_list(DOCUMENT_ALLOWED_EXTENSIONS),
            embedding_provider: "hashing".to_string(),
            voyage_api_key: None,
            voyage_embedding_model: VOYAGE_EMBEDDING_MODEL.to_string(),
            embedding_dim: EMBEDDING_DIM,
            embedding_timeout_secs: EMBEDDING_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config(Box::new(DocketConfig::default()));
        assert!(config.validate().is_ok());
        assert_eq!(config.storage_backend(), StorageBackend::Local);
        assert_eq!(config.document_allowed_extensions(), ["pdf", "txt", "md"]);
        assert_eq!(config.upload_url_expiry_secs(), 3600);
    }

    #[test]
    fn test_validate_rejects_voyage_without_key() {
        let mut inner = DocketConfig::default();
        inner.embedding_provider = "voyage".to_string();
        let err = Config(Box::new(inner)).validate().unwrap_err();
        assert!(err.to_string().contains("VOYAGE_API_KEY"));
    }

    #[test]
    fn test_validate_requires_bucket_for_s3() {
        let mut inner = DocketConfig::default();
        inner.storage_backend = Some(StorageBackend::S3);
        inner.aws_region = Some("us-east-1".to_string());
        let err = Config(Box::new(inner)).validate().unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn test_s3_region_falls_back_to_aws_region() {
        let mut inner = DocketConfig::default();
        inner.aws_region = Some("eu-west-1".to_string());
        let config = Config(Box::new(inner));
        assert_eq!(config.s3_region(), Some("eu-west-1"));
    }

    #[test]
    fn test_parse_list_normalizes_extensions() {
        assert_eq!(parse_list(" .PDF, txt ,,md"), vec!["pdf", "txt", "md"]);
        assert!(parse_list("").is_empty());
    }
}
