//! Storage seams used by the import pipeline
//!
//! The runner only talks to these traits. Production uses a Postgres
//! session holding one pooled connection per job or request
//! (`db::session::PgImportSession`); tests use the in-memory store.
//!
//! Every record method takes the owning account id explicitly. Creation
//! payloads carry no owner field, so imported data cannot change it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{
    ImportJob, ImportState, ImportSummary, NewContact, NewExpense, NewIngredient,
    NewMileageLog, NewOrder, NewSupply,
};

/// Persistence of import job lifecycle
#[async_trait]
pub trait JobStore: Send {
    /// Create a job in the queued state
    async fn create_job(
        &mut self,
        account_id: Uuid,
        source_name: Option<&str>,
    ) -> Result<ImportJob>;

    async fn get_job(&mut self, job_id: Uuid) -> Result<Option<ImportJob>>;

    /// All jobs in `state`, oldest first
    async fn list_jobs(&mut self, state: ImportState) -> Result<Vec<ImportJob>>;

    /// queued -> processing. Returns false when the job was not queued.
    async fn mark_processing(&mut self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<bool>;

    /// processing -> completed | failed, writing the summary once.
    /// Returns false when the job was not processing.
    async fn finish_job(
        &mut self,
        job_id: Uuid,
        state: ImportState,
        ended_at: DateTime<Utc>,
        summary: &ImportSummary,
    ) -> Result<bool>;
}

/// Lookups and record creation for imported rows
#[async_trait]
pub trait RecordStore: Send {
    async fn order_number_exists(&mut self, account_id: Uuid, order_number: &str) -> Result<bool>;

    async fn find_contact_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> Result<Option<Uuid>>;

    /// Absent parts only match absent parts
    async fn find_contact_by_name(
        &mut self,
        account_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        company_name: Option<&str>,
    ) -> Result<Option<Uuid>>;

    async fn create_contact(&mut self, account_id: Uuid, contact: &NewContact) -> Result<Uuid>;

    async fn create_order(&mut self, account_id: Uuid, order: &NewOrder) -> Result<Uuid>;

    async fn create_expense(&mut self, account_id: Uuid, expense: &NewExpense) -> Result<Uuid>;

    async fn create_ingredient(
        &mut self,
        account_id: Uuid,
        ingredient: &NewIngredient,
    ) -> Result<Uuid>;

    async fn create_supply(&mut self, account_id: Uuid, supply: &NewSupply) -> Result<Uuid>;

    async fn create_mileage_log(&mut self, account_id: Uuid, log: &NewMileageLog) -> Result<Uuid>;
}
