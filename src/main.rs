//! BakeMate Worker - bulk import service for the bakery back office
//!
//! This worker connects to NATS and handles import requests from the
//! back-office frontend. It also has CLI commands for one-off imports.

mod auth;
mod cli;
mod config;
mod db;
mod error;
mod handlers;
mod services;
mod types;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use uuid::Uuid;

use cli::{Cli, Command};
use db::session::PgImportSession;
use services::import_runner;
use services::import_source::ImportSource;
use services::store::JobStore;
use types::EntityKind;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,bakemate_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())  // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))  // file
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Migrate => migrate().await,
        Command::Import { account, file } => import_file(account, &file).await,
        Command::Scan { account, kind, dir } => scan(account, kind, dir).await,
    }
}

async fn serve() -> Result<()> {
    info!("Starting BakeMate Worker...");

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    // Run migrations
    db::run_migrations(&pool).await?;
    info!("Database migrations complete");

    let interrupted = db::recover_interrupted_jobs(&pool).await?;
    if !interrupted.abandoned.is_empty() {
        warn!(
            "Failed {} import job(s) left queued by the previous run",
            interrupted.abandoned.len()
        );
    }
    if !interrupted.processing.is_empty() {
        warn!(
            "{} import job(s) were interrupted and stay in processing",
            interrupted.processing.len()
        );
    }

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    // Start message handlers
    let handler_result = handlers::start_handlers(nats_client, pool, &config).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn migrate() -> Result<()> {
    let database_url = config::database_url_from_env()?;
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database migrations complete");
    Ok(())
}

/// Run one import job in this process and print the finished job
async fn import_file(account_id: Uuid, file: &Path) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Import file has no file name")?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let source = ImportSource::from_upload(&name, bytes)
        .with_context(|| format!("Unsupported import file: {}", name))?;

    let database_url = config::database_url_from_env()?;
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let mut session = PgImportSession::acquire(&pool).await?;
    let job = session.create_job(account_id, Some(source.name())).await?;
    info!("Created import job {} for {}", job.id, name);

    let job = import_runner::run_job(&mut session, job.id, &source).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

/// Import matching CSVs from a directory and print the counts
async fn scan(account_id: Uuid, kind: EntityKind, dir: Option<std::path::PathBuf>) -> Result<()> {
    let database_url = config::database_url_from_env()?;
    let dir = dir.unwrap_or_else(config::import_dir_from_env);
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let mut session = PgImportSession::acquire(&pool).await?;
    let response = import_runner::import_directory(&mut session, account_id, kind, &dir).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
