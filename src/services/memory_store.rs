//! In-memory store for tests (deterministic, no database)

use std::collections::HashSet;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{JobStore, RecordStore};
use crate::types::{
    ImportJob, ImportState, ImportSummary, NewContact, NewExpense, NewIngredient,
    NewMileageLog, NewOrder, NewSupply,
};

/// A stored record together with its owner and id
#[derive(Debug, Clone)]
pub struct Owned<T> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub record: T,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub jobs: Vec<ImportJob>,
    pub contacts: Vec<Owned<NewContact>>,
    pub orders: Vec<Owned<NewOrder>>,
    pub expenses: Vec<Owned<NewExpense>>,
    pub ingredients: Vec<Owned<NewIngredient>>,
    pub supplies: Vec<Owned<NewSupply>>,
    pub mileage_logs: Vec<Owned<NewMileageLog>>,
    /// Order numbers whose insert fails, as a unique index violation would
    pub rejected_order_numbers: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<T>(records: &mut Vec<Owned<T>>, account_id: Uuid, record: T) -> Uuid {
        let id = Uuid::new_v4();
        records.push(Owned { id, account_id, record });
        id
    }

    fn job_mut(&mut self, job_id: Uuid) -> Option<&mut ImportJob> {
        self.jobs.iter_mut().find(|job| job.id == job_id)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(
        &mut self,
        account_id: Uuid,
        source_name: Option<&str>,
    ) -> Result<ImportJob> {
        let job = ImportJob {
            id: Uuid::new_v4(),
            account_id,
            state: ImportState::Queued,
            source_name: source_name.map(str::to_string),
            started_at: None,
            ended_at: None,
            summary: None,
            created_at: Utc::now(),
        };
        self.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job(&mut self, job_id: Uuid) -> Result<Option<ImportJob>> {
        Ok(self.jobs.iter().find(|job| job.id == job_id).cloned())
    }

    async fn list_jobs(&mut self, state: ImportState) -> Result<Vec<ImportJob>> {
        let mut jobs: Vec<ImportJob> = self
            .jobs
            .iter()
            .filter(|job| job.state == state)
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn mark_processing(&mut self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<bool> {
        match self.job_mut(job_id) {
            Some(job) if job.state == ImportState::Queued => {
                job.state = ImportState::Processing;
                job.started_at = Some(started_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finish_job(
        &mut self,
        job_id: Uuid,
        state: ImportState,
        ended_at: DateTime<Utc>,
        summary: &ImportSummary,
    ) -> Result<bool> {
        match self.job_mut(job_id) {
            Some(job) if job.state == ImportState::Processing && state.is_terminal() => {
                job.state = state;
                job.ended_at = Some(ended_at);
                job.summary = Some(summary.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn order_number_exists(&mut self, account_id: Uuid, order_number: &str) -> Result<bool> {
        Ok(self
            .orders
            .iter()
            .any(|o| o.account_id == account_id && o.record.order_number == order_number))
    }

    async fn find_contact_by_email(
        &mut self,
        account_id: Uuid,
        email: &str,
    ) -> Result<Option<Uuid>> {
        Ok(self
            .contacts
            .iter()
            .find(|c| c.account_id == account_id && c.record.email.as_deref() == Some(email))
            .map(|c| c.id))
    }

    async fn find_contact_by_name(
        &mut self,
        account_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        company_name: Option<&str>,
    ) -> Result<Option<Uuid>> {
        Ok(self
            .contacts
            .iter()
            .find(|c| {
                c.account_id == account_id
                    && c.record.first_name.as_deref() == first_name
                    && c.record.last_name.as_deref() == last_name
                    && c.record.company_name.as_deref() == company_name
            })
            .map(|c| c.id))
    }

    async fn create_contact(&mut self, account_id: Uuid, contact: &NewContact) -> Result<Uuid> {
        Ok(Self::insert(&mut self.contacts, account_id, contact.clone()))
    }

    async fn create_order(&mut self, account_id: Uuid, order: &NewOrder) -> Result<Uuid> {
        let taken = self
            .orders
            .iter()
            .any(|o| o.account_id == account_id && o.record.order_number == order.order_number);
        if taken || self.rejected_order_numbers.contains(&order.order_number) {
            bail!(
                "duplicate key value violates unique constraint \"orders_user_id_order_number_key\""
            );
        }
        Ok(Self::insert(&mut self.orders, account_id, order.clone()))
    }

    async fn create_expense(&mut self, account_id: Uuid, expense: &NewExpense) -> Result<Uuid> {
        Ok(Self::insert(&mut self.expenses, account_id, expense.clone()))
    }

    async fn create_ingredient(
        &mut self,
        account_id: Uuid,
        ingredient: &NewIngredient,
    ) -> Result<Uuid> {
        Ok(Self::insert(&mut self.ingredients, account_id, ingredient.clone()))
    }

    async fn create_supply(&mut self, account_id: Uuid, supply: &NewSupply) -> Result<Uuid> {
        Ok(Self::insert(&mut self.supplies, account_id, supply.clone()))
    }

    async fn create_mileage_log(&mut self, account_id: Uuid, log: &NewMileageLog) -> Result<Uuid> {
        Ok(Self::insert(&mut self.mileage_logs, account_id, log.clone()))
    }
}
