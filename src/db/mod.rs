//! Database module

pub mod queries;
pub mod session;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::services::import_runner::{self, InterruptedJobs};

/// Create a database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Run the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    let migrator = sqlx::migrate!("./migrations");
    let versions: Vec<i64> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect();
    info!("Compiled migration versions: {:?}", versions);

    migrator.run(pool).await?;
    Ok(())
}

/// Deal with jobs a previous worker process left behind
pub async fn recover_interrupted_jobs(pool: &PgPool) -> Result<InterruptedJobs> {
    let mut session = session::PgImportSession::acquire(pool).await?;
    import_runner::recover_interrupted_jobs(&mut session).await
}
