//! Import job types: lifecycle state, summary and poll responses

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BatchOutcome, EntityKind};

// ==========================================================================
// Tests First (TDD)
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ImportState::Queued).unwrap(), "\"queued\"");
        assert_eq!(serde_json::to_string(&ImportState::Processing).unwrap(), "\"processing\"");
        assert_eq!(serde_json::to_string(&ImportState::Completed).unwrap(), "\"completed\"");
        assert_eq!(serde_json::to_string(&ImportState::Failed).unwrap(), "\"failed\"");
    }

    #[test]
    fn test_only_completed_and_failed_are_terminal() {
        assert!(!ImportState::Queued.is_terminal());
        assert!(!ImportState::Processing.is_terminal());
        assert!(ImportState::Completed.is_terminal());
        assert!(ImportState::Failed.is_terminal());
    }

    #[test]
    fn test_summary_starts_with_zeroed_counters() {
        let summary = ImportSummary::for_kinds([EntityKind::Ingredients, EntityKind::Expenses]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ingredients": {"created": 0, "errors": 0},
                "expenses": {"created": 0, "errors": 0}
            })
        );
    }

    #[test]
    fn test_summary_records_batches() {
        let mut summary = ImportSummary::for_kinds([EntityKind::Orders]);
        summary.record(
            EntityKind::Orders,
            BatchOutcome {
                created: 2,
                skipped: 1,
                errors: 1,
                messages: vec!["Orders.csv:3: Missing OrderNumber".to_string()],
            },
        );
        summary.record(
            EntityKind::Orders,
            BatchOutcome { created: 1, ..Default::default() },
        );

        let orders = summary.counters(EntityKind::Orders);
        assert_eq!(orders.created, 3);
        assert_eq!(orders.errors, 1);
        assert_eq!(orders.skipped, 1);
        assert_eq!(summary.errors.len(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["orders"]["skipped"], 1);
        assert_eq!(json["errors"][0], "Orders.csv:3: Missing OrderNumber");
    }

    #[test]
    fn test_summary_roundtrips_through_json() {
        let mut summary = ImportSummary::for_kinds([EntityKind::Supplies]);
        summary.record(EntityKind::Supplies, BatchOutcome { created: 4, ..Default::default() });
        summary.errors.push("Failed to process broken.csv: bad archive entry".to_string());

        let json = serde_json::to_string(&summary).unwrap();
        let parsed: ImportSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_status_response_hides_summary_until_terminal() {
        let mut job = ImportJob {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            state: ImportState::Processing,
            source_name: Some("bakery.xlsx".to_string()),
            started_at: Some(Utc::now()),
            ended_at: None,
            summary: Some(ImportSummary::default()),
            created_at: Utc::now(),
        };
        let response = ImportJobStatusResponse::from(&job);
        assert_eq!(response.status, ImportState::Processing);
        assert!(response.summary.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["summary"].is_null());
        assert_eq!(json["job_id"], job.id.to_string());

        job.state = ImportState::Completed;
        let response = ImportJobStatusResponse::from(&job);
        assert!(response.summary.is_some());
    }
}

// ==========================================================================
// Implementation
// ==========================================================================

/// Lifecycle of an import job. Transitions only move forward:
/// queued -> processing -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "import_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ImportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportState::Completed | ImportState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportState::Queued => "queued",
            ImportState::Processing => "processing",
            ImportState::Completed => "completed",
            ImportState::Failed => "failed",
        }
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Per-entity counters inside a job summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounters {
    pub created: u32,
    pub errors: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub skipped: u32,
}

/// Final result of a job, keyed by entity kind (`"orders"`, `"expenses"`, ...)
/// plus the collected row and file error messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(flatten)]
    pub entities: BTreeMap<String, EntityCounters>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn for_kinds(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        Self {
            entities: kinds
                .into_iter()
                .map(|kind| (kind.as_str().to_string(), EntityCounters::default()))
                .collect(),
            errors: Vec::new(),
        }
    }

    pub fn counters(&self, kind: EntityKind) -> EntityCounters {
        self.entities.get(kind.as_str()).copied().unwrap_or_default()
    }

    pub fn record(&mut self, kind: EntityKind, outcome: BatchOutcome) {
        let counters = self.entities.entry(kind.as_str().to_string()).or_default();
        counters.created += outcome.created;
        counters.errors += outcome.errors;
        counters.skipped += outcome.skipped;
        self.errors.extend(outcome.messages);
    }
}

/// Persisted import job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: Uuid,
    pub account_id: Uuid,
    pub state: ImportState,
    pub source_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: Option<ImportSummary>,
    pub created_at: DateTime<Utc>,
}

/// Reply to a job submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJobSubmitResponse {
    pub job_id: Uuid,
    pub status: ImportState,
}

/// Reply to a job poll. `summary` stays null until the job is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJobStatusResponse {
    pub job_id: Uuid,
    pub status: ImportState,
    pub summary: Option<ImportSummary>,
}

impl From<&ImportJob> for ImportJobStatusResponse {
    fn from(job: &ImportJob) -> Self {
        Self {
            job_id: job.id,
            status: job.state,
            summary: if job.state.is_terminal() {
                job.summary.clone()
            } else {
                None
            },
        }
    }
}
