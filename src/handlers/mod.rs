//! NATS message handlers

pub mod import;
pub mod ping;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use sqlx::PgPool;
use tokio::select;
use tracing::{error, info};

use crate::config::Config;
use crate::services::import_queue::ImportQueue;
use import::ImportContext;

/// Start all message handlers
pub async fn start_handlers(client: Client, pool: PgPool, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    let (queue, queue_handle) = ImportQueue::start(pool.clone());
    let ctx = ImportContext {
        pool: pool.clone(),
        queue,
        jwt_secret: Arc::new(config.jwt_secret.clone()),
        import_dir: config.import_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };
    info!("Import directory: {}", ctx.import_dir.display());

    // Subscribe to all subjects
    let ping_sub = client.subscribe("bakemate.ping").await?;
    let submit_sub = client.subscribe("bakemate.import.submit").await?;
    let status_sub = client.subscribe("bakemate.import.status").await?;
    let csv_sub = client.subscribe("bakemate.import.csv").await?;
    let scan_sub = client.subscribe("bakemate.import.scan").await?;

    info!("Subscribed to NATS subjects");

    let ping_handle = tokio::spawn(ping::handle_ping(client.clone(), ping_sub, pool));
    let submit_handle =
        tokio::spawn(import::handle_submit(client.clone(), submit_sub, ctx.clone()));
    let status_handle =
        tokio::spawn(import::handle_status(client.clone(), status_sub, ctx.clone()));
    let csv_handle = tokio::spawn(import::handle_csv(client.clone(), csv_sub, ctx.clone()));
    let scan_handle = tokio::spawn(import::handle_scan(client.clone(), scan_sub, ctx));

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which would indicate an error)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = submit_handle => {
            error!("Import submit handler finished: {:?}", result);
        }
        result = status_handle => {
            error!("Import status handler finished: {:?}", result);
        }
        result = csv_handle => {
            error!("CSV import handler finished: {:?}", result);
        }
        result = scan_handle => {
            error!("Import scan handler finished: {:?}", result);
        }
        result = queue_handle => {
            error!("Import queue finished: {:?}", result);
        }
    }

    Ok(())
}
