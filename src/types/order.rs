//! Order types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Inquiry,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Map the numeric status id used by the legacy order export.
    /// Anything unknown becomes an inquiry.
    pub fn from_status_id(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some("2") => OrderStatus::Confirmed,
            Some("3") => OrderStatus::InProgress,
            Some("4") => OrderStatus::Completed,
            Some("5") => OrderStatus::Cancelled,
            _ => OrderStatus::Inquiry,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Inquiry => "INQUIRY",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Order creation payload. The owning account is passed separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_company: Option<String>,
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub delivery_fee: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub event_type: Option<String>,
    pub theme_details: Option<String>,
    pub internal_notes: Option<String>,
}
