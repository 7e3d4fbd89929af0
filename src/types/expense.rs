//! Expense types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    Ingredients,
    Supplies,
    Utilities,
    Rent,
    Marketing,
    Fees,
    Other,
}

impl ExpenseCategory {
    /// Map a free-text category label from a spreadsheet. Unknown labels are `Other`.
    pub fn from_label(label: Option<&str>) -> Self {
        let label = label.map(|l| l.trim().to_lowercase()).unwrap_or_default();
        match label.as_str() {
            "ingredients" => ExpenseCategory::Ingredients,
            "supplies" | "box" | "board" => ExpenseCategory::Supplies,
            "internet" | "utilities" => ExpenseCategory::Utilities,
            "website" | "printing" | "advertising" | "marketing" => ExpenseCategory::Marketing,
            "fees" => ExpenseCategory::Fees,
            "rent" => ExpenseCategory::Rent,
            _ => ExpenseCategory::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Ingredients => "INGREDIENTS",
            ExpenseCategory::Supplies => "SUPPLIES",
            ExpenseCategory::Utilities => "UTILITIES",
            ExpenseCategory::Rent => "RENT",
            ExpenseCategory::Marketing => "MARKETING",
            ExpenseCategory::Fees => "FEES",
            ExpenseCategory::Other => "OTHER",
        }
    }
}

/// Expense creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub vendor: Option<String>,
    pub vat_amount: f64,
    pub payment_source: Option<String>,
}
