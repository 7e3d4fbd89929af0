//! Import runner
//!
//! Streams rows from an import source through the row parser, duplicate
//! check and contact resolver into the record store. Row failures are
//! counted and reported; they never stop the batch. The same row pipeline
//! serves queued jobs, synchronous CSV uploads and directory scans.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::contact_resolver::resolve_contact;
use super::duplicates::{self, NaturalKey};
use super::import_source::{self, ImportSource, SourceRows};
use super::row_parser::{self, RawRow};
use super::store::{JobStore, RecordStore};
use crate::error::{ImportError, SkipReason};
use crate::types::{
    BatchImportResponse, BatchOutcome, EntityKind, ImportJob, ImportState, ImportSummary,
};

const INTERRUPTED_BEFORE_START: &str =
    "The worker restarted before this import started, please upload the file again";

/// Result of one row that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Skipped(SkipReason),
}

// =============================================================================
// ROWS
// =============================================================================

async fn import_row<S>(
    store: &mut S,
    account_id: Uuid,
    kind: EntityKind,
    row: &RawRow,
) -> Result<RowOutcome, ImportError>
where
    S: RecordStore + ?Sized,
{
    let created = match kind {
        EntityKind::Orders => return import_order_row(store, account_id, row).await,
        EntityKind::Expenses => {
            let expense = row_parser::parse_expense(row)?;
            store.create_expense(account_id, &expense).await
        }
        EntityKind::Mileage => {
            let log = row_parser::parse_mileage(row)?;
            store.create_mileage_log(account_id, &log).await
        }
        EntityKind::Ingredients => {
            let ingredient = row_parser::parse_ingredient(row)?;
            store.create_ingredient(account_id, &ingredient).await
        }
        EntityKind::Supplies => {
            let supply = row_parser::parse_supply(row)?;
            store.create_supply(account_id, &supply).await
        }
    };
    created.map_err(ImportError::persistence)?;

    Ok(RowOutcome::Created)
}

async fn import_order_row<S>(
    store: &mut S,
    account_id: Uuid,
    row: &RawRow,
) -> Result<RowOutcome, ImportError>
where
    S: RecordStore + ?Sized,
{
    if row_parser::is_quote(row) {
        return Ok(RowOutcome::Skipped(SkipReason::Quote));
    }

    let number = row_parser::order_number(row)?;
    let duplicate = duplicates::exists(store, account_id, NaturalKey::OrderNumber(&number))
        .await
        .map_err(ImportError::persistence)?;
    if duplicate {
        return Ok(RowOutcome::Skipped(SkipReason::DuplicateRecord));
    }

    let mut parsed = row_parser::parse_order(row, number)?;
    parsed.order.customer_id = resolve_contact(store, account_id, &parsed.contact)
        .await
        .map_err(ImportError::persistence)?;

    store
        .create_order(account_id, &parsed.order)
        .await
        .map_err(ImportError::persistence)?;

    Ok(RowOutcome::Created)
}

/// Import every row of one file or sheet
pub async fn import_rows<S>(store: &mut S, account_id: Uuid, source: SourceRows) -> BatchOutcome
where
    S: RecordStore + ?Sized,
{
    let SourceRows { kind, file, rows } = source;
    let mut outcome = BatchOutcome::default();

    for source_row in rows {
        let result = match source_row.row {
            Ok(raw) => import_row(store, account_id, kind, &raw).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(RowOutcome::Created) => outcome.created += 1,
            Ok(RowOutcome::Skipped(reason)) => {
                debug!("{}:{}: skipped ({:?})", file, source_row.line, reason);
                outcome.skipped += 1;
            }
            Err(e) => {
                let message = format!("{}:{}: {}", file, source_row.line, e);
                warn!("{}", message);
                outcome.errors += 1;
                outcome.messages.push(message);
            }
        }
    }

    info!(
        "Imported {} ({}): {} created, {} skipped, {} failed",
        file, kind, outcome.created, outcome.skipped, outcome.errors
    );
    outcome
}

// =============================================================================
// QUEUED JOBS
// =============================================================================

async fn process_source<S>(
    store: &mut S,
    account_id: Uuid,
    source: &ImportSource,
    summary: &mut ImportSummary,
) -> Result<(), ImportError>
where
    S: RecordStore + ?Sized,
{
    match source {
        ImportSource::Workbook { name, bytes } => {
            for sheet in import_source::read_workbook(name, bytes)? {
                let kind = sheet.kind;
                let outcome = import_rows(store, account_id, sheet).await;
                summary.record(kind, outcome);
            }
        }
        ImportSource::Csv { name, kind, bytes } => {
            let rows = import_source::read_csv(name, *kind, bytes)?;
            let outcome = import_rows(store, account_id, rows).await;
            summary.record(*kind, outcome);
        }
        ImportSource::Archive { name, bytes } => {
            for member in import_source::read_archive(name, bytes)? {
                match member {
                    Ok(rows) => {
                        let kind = rows.kind;
                        let outcome = import_rows(store, account_id, rows).await;
                        summary.record(kind, outcome);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        summary.errors.push(e.to_string());
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run a queued job to its terminal state and return the final job.
///
/// A source that cannot be opened fails the job; the partial summary and
/// `ended_at` are still written.
pub async fn run_job<S>(store: &mut S, job_id: Uuid, source: &ImportSource) -> Result<ImportJob>
where
    S: JobStore + RecordStore + ?Sized,
{
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| anyhow!("Import job {} not found", job_id))?;

    let started_at = Utc::now();
    if !store.mark_processing(job_id, started_at).await? {
        bail!("Import job {} is {}, not queued", job_id, job.state);
    }
    info!("Import job {} processing {} for account {}", job_id, source.name(), job.account_id);

    let mut summary = ImportSummary::for_kinds(source.summary_kinds());
    let state = match process_source(store, job.account_id, source, &mut summary).await {
        Ok(()) => ImportState::Completed,
        Err(e) => {
            error!("Import job {} failed: {}", job_id, e);
            summary.errors.push(e.to_string());
            ImportState::Failed
        }
    };

    let ended_at = Utc::now();
    if !store.finish_job(job_id, state, ended_at, &summary).await? {
        bail!("Import job {} left processing before it finished", job_id);
    }
    info!("Import job {} {}", job_id, state);

    Ok(ImportJob {
        state,
        started_at: Some(started_at),
        ended_at: Some(ended_at),
        summary: Some(summary),
        ..job
    })
}

/// Fail a job that never reached the runner (for example, the queue was gone)
pub async fn abandon_job<S>(store: &mut S, job_id: Uuid, reason: &str) -> Result<()>
where
    S: JobStore + ?Sized,
{
    store.mark_processing(job_id, Utc::now()).await?;
    let summary = ImportSummary {
        errors: vec![reason.to_string()],
        ..Default::default()
    };
    store
        .finish_job(job_id, ImportState::Failed, Utc::now(), &summary)
        .await?;
    Ok(())
}

/// Jobs found unfinished when the worker starts
#[derive(Debug, Default)]
pub struct InterruptedJobs {
    /// Were queued; their upload was lost with the old process, now failed
    pub abandoned: Vec<Uuid>,
    /// Were processing; left as they are for an operator
    pub processing: Vec<Uuid>,
}

/// Startup pass over unfinished jobs.
///
/// Uploads only live in the in-process queue, so a job still queued can
/// never start and is failed with a message asking for a new upload. A job
/// still processing may have written part of its rows; it is reported, not
/// touched.
pub async fn recover_interrupted_jobs<S>(store: &mut S) -> Result<InterruptedJobs>
where
    S: JobStore + ?Sized,
{
    let mut interrupted = InterruptedJobs::default();

    for job in store.list_jobs(ImportState::Queued).await? {
        warn!(
            "Import job {} for account {} was still queued when the worker stopped, failing it",
            job.id, job.account_id
        );
        abandon_job(store, job.id, INTERRUPTED_BEFORE_START).await?;
        interrupted.abandoned.push(job.id);
    }

    for job in store.list_jobs(ImportState::Processing).await? {
        warn!(
            "Import job {} for account {} is stuck in processing (started {:?}, source {:?})",
            job.id, job.account_id, job.started_at, job.source_name
        );
        interrupted.processing.push(job.id);
    }

    Ok(interrupted)
}

// =============================================================================
// SYNCHRONOUS IMPORTS
// =============================================================================

/// Import one CSV file and report counts directly
pub async fn import_csv_file<S>(
    store: &mut S,
    account_id: Uuid,
    kind: EntityKind,
    file_name: &str,
    bytes: &[u8],
) -> BatchImportResponse
where
    S: RecordStore + ?Sized,
{
    match import_source::read_csv(file_name, kind, bytes) {
        Ok(rows) => import_rows(store, account_id, rows).await.into(),
        Err(e) => {
            warn!("{}", e);
            BatchImportResponse {
                errors: vec![e.to_string()],
                ..Default::default()
            }
        }
    }
}

/// Import every `*<Kind>*.csv` file in `dir`
pub async fn import_directory<S>(
    store: &mut S,
    account_id: Uuid,
    kind: EntityKind,
    dir: &Path,
) -> BatchImportResponse
where
    S: RecordStore + ?Sized,
{
    let files = match import_source::scan_directory(dir, kind) {
        Ok(files) => files,
        Err(e) => {
            error!("Failed to read import directory {}: {}", dir.display(), e);
            return BatchImportResponse {
                errors: vec![format!("Failed to read import directory {}: {}", dir.display(), e)],
                files: Some(Vec::new()),
                ..Default::default()
            };
        }
    };

    if files.is_empty() {
        return BatchImportResponse {
            errors: vec![format!("No {} CSV found.", kind.file_token())],
            files: Some(Vec::new()),
            ..Default::default()
        };
    }

    let mut outcome = BatchOutcome::default();
    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        names.push(path.display().to_string());

        let rows = match tokio::fs::read(&path).await {
            Ok(bytes) => import_source::read_csv(&label, kind, &bytes),
            Err(e) => Err(ImportError::unreadable(label.as_str(), e)),
        };
        match rows {
            Ok(rows) => outcome.merge(import_rows(store, account_id, rows).await),
            Err(e) => {
                warn!("{}", e);
                outcome.messages.push(e.to_string());
            }
        }
    }

    let mut response = BatchImportResponse::from(outcome);
    response.files = Some(names);
    response
}

// =============================================================================
// Tests
// =============================================================================
