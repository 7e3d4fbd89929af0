//! Mileage log types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMileageLog {
    pub date: NaiveDate,
    pub distance: f64,
    pub purpose: Option<String>,
    /// Free-text order reference, not linked to an order row
    pub order_ref: Option<String>,
    pub notes: Option<String>,
}
