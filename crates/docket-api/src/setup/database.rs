//! Database setup and initialization

use anyhow::{Context, Result};
use docket_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Pools for the record store and the content index.
///
/// Both point at the same pool unless `INDEX_DATABASE_URL` names another database.
#[derive(Clone)]
pub struct DatabasePools {
    pub records: PgPool,
    pub index: PgPool,
}

async fn connect(config: &Config, url: &str, role: &str) -> Result<PgPool> {
    tracing::info!(role, "Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await
        .with_context(|| format!("Failed to connect to the {} database", role))?;

    tracing::info!(
        role,
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );
    Ok(pool)
}

async fn run_migrations(pool: &PgPool, role: &str) -> Result<()> {
    // Path: workspace migrations/ from crate root
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .with_context(|| format!("Failed to run {} database migrations", role))?;
    tracing::info!(role, "Database migrations applied");
    Ok(())
}

/// Setup connection pools and run migrations
pub async fn setup_database(config: &Config) -> Result<DatabasePools> {
    let records = connect(config, config.database_url(), "records").await?;
    run_migrations(&records, "records").await?;

    let index = if config.index_database_url() == config.database_url() {
        records.clone()
    } else {
        let index = connect(config, config.index_database_url(), "index").await?;
        run_migrations(&index, "index").await?;
        index
    };

    Ok(DatabasePools { records, index })
}
