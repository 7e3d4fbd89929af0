//! Import source and batch types shared by the synchronous and queued imports

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of record produced by an import file or workbook sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ingredients,
    Supplies,
    Expenses,
    Mileage,
    Orders,
}

/// Sheets read from an uploaded workbook, in processing order
pub const WORKBOOK_KINDS: [EntityKind; 3] = [
    EntityKind::Ingredients,
    EntityKind::Expenses,
    EntityKind::Supplies,
];

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Ingredients,
        EntityKind::Supplies,
        EntityKind::Expenses,
        EntityKind::Mileage,
        EntityKind::Orders,
    ];

    /// Key used in job summaries
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Ingredients => "ingredients",
            EntityKind::Supplies => "supplies",
            EntityKind::Expenses => "expenses",
            EntityKind::Mileage => "mileage",
            EntityKind::Orders => "orders",
        }
    }

    /// Token a CSV file name must contain to be read as this kind.
    /// Also the workbook sheet name for workbook kinds.
    pub fn file_token(self) -> &'static str {
        match self {
            EntityKind::Ingredients => "Ingredients",
            EntityKind::Supplies => "Supplies",
            EntityKind::Expenses => "Expenses",
            EntityKind::Mileage => "Mileage",
            EntityKind::Orders => "Orders",
        }
    }

    /// Canonical column names for the positional cells of a workbook sheet
    pub fn workbook_columns(self) -> Option<&'static [&'static str]> {
        match self {
            EntityKind::Ingredients => Some(&["Name", "Unit", "Price"]),
            EntityKind::Expenses => {
                Some(&["ExpenseDate", "Category", "Amount", "Vendor", "Description"])
            }
            EntityKind::Supplies => Some(&["Name", "Category", "Cost", "Quantity"]),
            EntityKind::Mileage | EntityKind::Orders => None,
        }
    }

    /// Match a CSV file name (`*Orders*.csv` and friends) to its kind
    pub fn from_file_name(name: &str) -> Option<Self> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        if !base.to_lowercase().ends_with(".csv") {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|kind| base.contains(kind.file_token()))
    }

    /// Whether a file name matches this kind's `*<Token>*.csv` pattern
    pub fn matches_file_name(self, name: &str) -> bool {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        base.to_lowercase().ends_with(".csv") && base.contains(self.file_token())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("Unknown import kind: {}", s))
    }
}

// =============================================================================
// BATCH RESULTS
// =============================================================================

/// Counts and messages collected while importing one file or sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub created: u32,
    pub skipped: u32,
    pub errors: u32,
    pub messages: Vec<String>,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.messages.extend(other.messages);
    }
}

/// Reply for synchronous CSV imports.
///
/// `skipped` counts both deliberately skipped rows and failed rows.
/// `files` is only present for directory scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchImportResponse {
    pub imported: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl From<BatchOutcome> for BatchImportResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            imported: outcome.created,
            skipped: outcome.skipped + outcome.errors,
            errors: outcome.messages,
            files: None,
        }
    }
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

/// Upload a workbook, archive or CSV for background processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitImportRequest {
    pub filename: String,
    /// Base64-encoded file content
    pub content_base64: String,
}

/// Poll a previously submitted job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatusRequest {
    pub job_id: Uuid,
}

/// Import a single CSV file synchronously
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportRequest {
    pub kind: EntityKind,
    #[serde(default)]
    pub filename: Option<String>,
    pub csv_content: String,
}

/// Import every matching CSV from the server's import directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanImportRequest {
    pub kind: EntityKind,
}
