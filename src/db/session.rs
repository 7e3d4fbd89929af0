//! Postgres-backed import session
//!
//! Holds one pooled connection for the lifetime of a job or a synchronous
//! import. Job state updates and row writes go through the same connection.
//! Statements autocommit, so a created contact is visible to the next row.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::queries;
use crate::services::store::{JobStore, RecordStore};
use crate::types::{
    ImportJob, ImportState, ImportSummary, NewContact, NewExpense, NewIngredient,
    NewMileageLog, NewOrder, NewSupply,
};

pub struct PgImportSession {
    conn: PoolConnection<Postgres>,
}

impl PgImportSession {
    pub async fn acquire(pool: &PgPool) -> Result<Self> {
        let conn = pool.acquire().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl JobStore for PgImportSession {
    async fn create_job(
        &mut self,
        account_id: Uuid,
        source_name: Option<&str>,
    ) -> Result<ImportJob> {
        queries::import_job::create_import_job(&mut self.conn, account_id, source_name).await
    }

    async fn get_job(&mut self, job_id: Uuid) -> Result<Option<ImportJob>> {
        queries::import_job::get_import_job(&mut self.conn, job_id).await
    }

    async fn list_jobs(&mut self, state: ImportState) -> Result<Vec<ImportJob>> {
        queries::import_job::list_import_jobs_in_state(&mut self.conn, state).await
    }

    async fn mark_processing(&mut self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<bool> {
        queries::import_job::mark_import_job_processing(&mut self.conn, job_id, started_at).await
    }

    async fn finish_job(
        &mut self,
        job_id: Uuid,
        state: ImportState,
        ended_at: DateTime<Utc>,
        summary: &ImportSummary,
    ) -> Result<bool> {
        queries::import_job::finish_import_job(&mut self.conn, job_id, state, ended_at, summary)
            .await
    }
}

#[async_trait]
impl RecordStore for PgImportSession {
    async fn order_number_exists(&mut self, account_id: Uuid, order_number: &str) -> Result<bool> {
        queries::order::order_number_exists(&mut self.conn, account_id, order_number).await
    }

    async fn find_contact_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> Result<Option<Uuid>> {
        queries::contact::find_contact_by_email(&mut self.conn, account_id, email).await
    }

    async fn find_contact_by_name(
        &mut self,
        account_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        company_name: Option<&str>,
    ) -> Result<Option<Uuid>> {
        queries::contact::find_contact_by_name(
            &mut self.conn,
            account_id,
            first_name,
            last_name,
            company_name,
        )
        .await
    }

    async fn create_contact(&mut self, account_id: Uuid, contact: &NewContact) -> Result<Uuid> {
        queries::contact::create_contact(&mut self.conn, account_id, contact).await
    }

    async fn create_order(&mut self, account_id: Uuid, order: &NewOrder) -> Result<Uuid> {
        queries::order::create_order(&mut self.conn, account_id, order).await
    }

    async fn create_expense(&mut self, account_id: Uuid, expense: &NewExpense) -> Result<Uuid> {
        queries::ledger::create_expense(&mut self.conn, account_id, expense).await
    }

    async fn create_ingredient(
        &mut self,
        account_id: Uuid,
        ingredient: &NewIngredient,
    ) -> Result<Uuid> {
        queries::ledger::create_ingredient(&mut self.conn, account_id, ingredient).await
    }

    async fn create_supply(&mut self, account_id: Uuid, supply: &NewSupply) -> Result<Uuid> {
        queries::ledger::create_supply(&mut self.conn, account_id, supply).await
    }

    async fn create_mileage_log(&mut self, account_id: Uuid, log: &NewMileageLog) -> Result<Uuid> {
        queries::ledger::create_mileage_log(&mut self.conn, account_id, log).await
    }
}
