//! In-process import queue
//!
//! Submitted jobs are handed to a single background task that runs them one
//! after another. There is no retry: a job that fails stays failed. Each job
//! runs on its own task, so a panic while importing fails that job only.
//! The queue is bounded because every entry holds a whole upload.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::import_runner;
use super::import_source::ImportSource;
use crate::db::session::PgImportSession;

/// Uploads waiting for the runner at most
const QUEUE_CAPACITY: usize = 16;

/// A created job and the file it imports
#[derive(Debug)]
pub struct QueuedImport {
    pub job_id: Uuid,
    pub source: ImportSource,
}

#[derive(Clone)]
pub struct ImportQueue {
    sender: mpsc::Sender<QueuedImport>,
}

impl ImportQueue {
    /// Spawn the background task draining the queue
    pub fn start(pool: PgPool) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = Self::with_capacity(QUEUE_CAPACITY);
        let handle = tokio::spawn(drain(pool, receiver));
        (queue, handle)
    }

    fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<QueuedImport>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Hand a job to the runner without waiting; fails when the queue is full
    pub fn enqueue(&self, import: QueuedImport) -> Result<()> {
        self.sender.try_send(import).map_err(|e| match e {
            TrySendError::Full(import) => anyhow!(
                "Import queue is full ({} jobs waiting), job {} was not started",
                QUEUE_CAPACITY,
                import.job_id
            ),
            TrySendError::Closed(_) => anyhow!("Import queue is not running"),
        })
    }
}

async fn drain(pool: PgPool, mut receiver: mpsc::Receiver<QueuedImport>) {
    info!("Import queue started");

    while let Some(import) = receiver.recv().await {
        let job_id = import.job_id;
        match tokio::spawn(run(pool.clone(), import)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Import job {} did not finish: {:#}", job_id, e),
            Err(e) => {
                let reason = crash_reason(e);
                error!("Import job {} crashed: {}", job_id, reason);
                if let Err(e) = fail_crashed(&pool, job_id, &reason).await {
                    error!("Failed to mark import job {} failed: {:#}", job_id, e);
                }
            }
        }
    }

    warn!("Import queue closed");
}

async fn run(pool: PgPool, import: QueuedImport) -> Result<()> {
    let mut session = PgImportSession::acquire(&pool).await?;
    let job = import_runner::run_job(&mut session, import.job_id, &import.source).await?;
    let summary = job.summary.unwrap_or_default();
    info!(
        "Import job {} {} ({} error messages)",
        job.id,
        job.state,
        summary.errors.len()
    );
    Ok(())
}

async fn fail_crashed(pool: &PgPool, job_id: Uuid, reason: &str) -> Result<()> {
    let mut session = PgImportSession::acquire(pool).await?;
    import_runner::abandon_job(&mut session, job_id, reason).await
}

/// Summary message for a job whose task did not return
fn crash_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return "Import was cancelled".to_string();
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("Import crashed: {}", detail),
        None => "Import crashed".to_string(),
    }
}
