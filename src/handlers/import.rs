//! Import message handlers
//!
//! - `bakemate.import.submit`: queue a workbook, archive or CSV upload
//! - `bakemate.import.status`: poll a queued job
//! - `bakemate.import.csv`: import one CSV synchronously
//! - `bakemate.import.scan`: import matching CSVs from the import directory

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subject, Subscriber};
use base64::Engine;
use futures::StreamExt;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth;
use crate::db::session::PgImportSession;
use crate::services::import_queue::{ImportQueue, QueuedImport};
use crate::services::import_runner;
use crate::services::import_source::ImportSource;
use crate::services::store::JobStore;
use crate::types::{
    CsvImportRequest, ErrorResponse, ImportJob, ImportJobStatusResponse, ImportJobSubmitResponse,
    ImportStatusRequest, Request, ScanImportRequest, SubmitImportRequest, SuccessResponse,
};

/// Settings shared by the import handlers
#[derive(Clone)]
pub struct ImportContext {
    pub pool: PgPool,
    pub queue: ImportQueue,
    pub jwt_secret: Arc<String>,
    pub import_dir: PathBuf,
    pub max_upload_bytes: usize,
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_error(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    code: &str,
    message: impl Into<String>,
) -> Result<()> {
    let error = ErrorResponse::new(request_id, code, message);
    let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
    Ok(())
}

async fn send_success<T: Serialize>(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    payload: T,
) -> Result<()> {
    let success = SuccessResponse::new(request_id, payload);
    client.publish(reply, serde_json::to_vec(&success)?.into()).await?;
    Ok(())
}

fn extract_request_id(payload: &[u8]) -> Uuid {
    serde_json::from_slice::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .and_then(|id| Uuid::parse_str(&id).ok())
        .unwrap_or_else(Uuid::nil)
}

/// Decode an upload into an import source, or an error code and message
fn decode_upload(
    upload: &SubmitImportRequest,
    max_upload_bytes: usize,
) -> std::result::Result<ImportSource, (&'static str, String)> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(upload.content_base64.trim())
        .map_err(|e| ("INVALID_REQUEST", format!("Invalid base64 content: {}", e)))?;

    if bytes.len() > max_upload_bytes {
        return Err((
            "INVALID_REQUEST",
            format!("Upload is {} bytes, the limit is {} bytes", bytes.len(), max_upload_bytes),
        ));
    }

    ImportSource::from_upload(&upload.filename, bytes).ok_or_else(|| {
        (
            "UNSUPPORTED_FILE",
            format!(
                "Unsupported file '{}': expected .xlsx, .zip or a CSV named like *Orders*.csv",
                upload.filename
            ),
        )
    })
}

/// Jobs are only visible to the account that submitted them
fn owned_by(job: Option<ImportJob>, account_id: Uuid) -> Option<ImportJob> {
    job.filter(|job| job.account_id == account_id)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Handle bakemate.import.submit messages
pub async fn handle_submit(
    client: Client,
    mut subscriber: Subscriber,
    ctx: ImportContext,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.submit message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<SubmitImportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import submit request: {}", e);
                let request_id = extract_request_id(&msg.payload);
                send_error(&client, reply, request_id, "INVALID_REQUEST", e.to_string()).await?;
                continue;
            }
        };

        let auth_info = match auth::extract_auth(&request, &ctx.jwt_secret) {
            Ok(info) => info,
            Err(e) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", e.to_string()).await?;
                continue;
            }
        };
        let account_id = auth_info.account_id();

        let source = match decode_upload(&request.payload, ctx.max_upload_bytes) {
            Ok(source) => source,
            Err((code, message)) => {
                warn!("Rejected upload from account {}: {}", account_id, message);
                send_error(&client, reply, request.id, code, message).await?;
                continue;
            }
        };

        let mut session = match PgImportSession::acquire(&ctx.pool).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to acquire database connection: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await?;
                continue;
            }
        };

        let job = match session.create_job(account_id, Some(source.name())).await {
            Ok(job) => job,
            Err(e) => {
                error!("Failed to create import job: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await?;
                continue;
            }
        };

        if let Err(e) = ctx.queue.enqueue(QueuedImport { job_id: job.id, source }) {
            error!("Failed to queue import job {}: {}", job.id, e);
            let reason = e.to_string();
            if let Err(abandon_err) =
                import_runner::abandon_job(&mut session, job.id, &reason).await
            {
                error!("Failed to mark import job {} failed: {}", job.id, abandon_err);
            }
            send_error(&client, reply, request.id, "SUBMIT_ERROR", e.to_string()).await?;
            continue;
        }

        info!("Import job {} queued for account {}", job.id, account_id);
        let response = ImportJobSubmitResponse {
            job_id: job.id,
            status: job.state,
        };
        send_success(&client, reply, request.id, response).await?;
    }

    Ok(())
}

/// Handle bakemate.import.status messages
pub async fn handle_status(
    client: Client,
    mut subscriber: Subscriber,
    ctx: ImportContext,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.status message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ImportStatusRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import status request: {}", e);
                let request_id = extract_request_id(&msg.payload);
                send_error(&client, reply, request_id, "INVALID_REQUEST", e.to_string()).await?;
                continue;
            }
        };

        let auth_info = match auth::extract_auth(&request, &ctx.jwt_secret) {
            Ok(info) => info,
            Err(e) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", e.to_string()).await?;
                continue;
            }
        };

        let job = match PgImportSession::acquire(&ctx.pool).await {
            Ok(mut session) => session.get_job(request.payload.job_id).await,
            Err(e) => Err(e),
        };

        match job.map(|job| owned_by(job, auth_info.account_id())) {
            Ok(Some(job)) => {
                let response = ImportJobStatusResponse::from(&job);
                send_success(&client, reply, request.id, response).await?;
            }
            Ok(None) => {
                send_error(&client, reply, request.id, "NOT_FOUND", "Import job not found").await?;
            }
            Err(e) => {
                error!("Failed to load import job {}: {}", request.payload.job_id, e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await?;
            }
        }
    }

    Ok(())
}

/// Handle bakemate.import.csv messages
pub async fn handle_csv(
    client: Client,
    mut subscriber: Subscriber,
    ctx: ImportContext,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.csv message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<CsvImportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse CSV import request: {}", e);
                let request_id = extract_request_id(&msg.payload);
                send_error(&client, reply, request_id, "INVALID_REQUEST", e.to_string()).await?;
                continue;
            }
        };

        let auth_info = match auth::extract_auth(&request, &ctx.jwt_secret) {
            Ok(info) => info,
            Err(e) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", e.to_string()).await?;
                continue;
            }
        };

        let mut session = match PgImportSession::acquire(&ctx.pool).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to acquire database connection: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await?;
                continue;
            }
        };

        let payload = request.payload;
        let file_name = payload
            .filename
            .unwrap_or_else(|| format!("{}.csv", payload.kind.file_token()));
        let response = import_runner::import_csv_file(
            &mut session,
            auth_info.account_id(),
            payload.kind,
            &file_name,
            payload.csv_content.as_bytes(),
        )
        .await;

        send_success(&client, reply, request.id, response).await?;
    }

    Ok(())
}

/// Handle bakemate.import.scan messages
pub async fn handle_scan(
    client: Client,
    mut subscriber: Subscriber,
    ctx: ImportContext,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.scan message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<ScanImportRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse import scan request: {}", e);
                let request_id = extract_request_id(&msg.payload);
                send_error(&client, reply, request_id, "INVALID_REQUEST", e.to_string()).await?;
                continue;
            }
        };

        let auth_info = match auth::extract_auth(&request, &ctx.jwt_secret) {
            Ok(info) => info,
            Err(e) => {
                send_error(&client, reply, request.id, "UNAUTHORIZED", e.to_string()).await?;
                continue;
            }
        };

        let mut session = match PgImportSession::acquire(&ctx.pool).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to acquire database connection: {}", e);
                send_error(&client, reply, request.id, "DATABASE_ERROR", e.to_string()).await?;
                continue;
            }
        };

        let response = import_runner::import_directory(
            &mut session,
            auth_info.account_id(),
            request.payload.kind,
            &ctx.import_dir,
        )
        .await;

        send_success(&client, reply, request.id, response).await?;
    }

    Ok(())
}

// ==========================================================================
// Tests
// ==========================================================================
