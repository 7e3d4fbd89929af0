//! Row parser
//!
//! Turns one raw row (column name -> cell text) into a typed creation payload.
//! Parsing is pure: no lookups, no persistence.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::error::ImportError;
use crate::types::{
    ContactFields, EntityKind, ExpenseCategory, NewExpense, NewIngredient, NewMileageLog,
    NewOrder, NewSupply, OrderStatus,
};

const ISO_DATE: &str = "%Y-%m-%d";
const US_DATE: &str = "%m/%d/%Y";

const ORDER_TAX_COLUMNS: [&str; 6] = [
    "ShippingTaxAmount",
    "TaxAmount1",
    "TaxAmount2",
    "TaxAmount3",
    "TaxAmount4",
    "TaxAmount5",
];

const DEFAULT_EXPENSE_DESCRIPTION: &str = "(no description)";

// =============================================================================
// RAW ROWS
// =============================================================================

/// One row of an import file, keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into().trim().to_string(), v.into()))
                .collect(),
        }
    }

    /// Cell text exactly as read
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Trimmed cell text, absent when empty or `NULL`
    pub fn text(&self, column: &str) -> Option<String> {
        self.raw(column).and_then(none_if_null)
    }

    /// First present value among alternative column names
    pub fn text_any(&self, columns: &[&str]) -> Option<String> {
        columns.iter().find_map(|column| self.text(column))
    }

    pub fn amount(&self, column: &str) -> f64 {
        self.raw(column).map(parse_amount).unwrap_or(0.0)
    }

    /// Amount from the first column that has a value
    pub fn amount_any(&self, columns: &[&str]) -> f64 {
        self.text_any(columns)
            .map(|value| parse_amount(&value))
            .unwrap_or(0.0)
    }

    /// Sum of several amount columns; missing columns count as zero
    pub fn sum(&self, columns: &[&str]) -> f64 {
        columns.iter().map(|column| self.amount(column)).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

// =============================================================================
// SCALAR PARSING
// =============================================================================

/// Trim a string; empty and `NULL` (any case) mean absent
pub fn none_if_null(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a money/quantity value. Thousands separators are dropped;
/// anything unparsable is zero.
pub fn parse_amount(value: &str) -> f64 {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Which of the two accepted date layouts is tried first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `YYYY-MM-DD`, then `MM/DD/YYYY`
    IsoFirst,
    /// `MM/DD/YYYY`, then `YYYY-MM-DD`
    MonthFirst,
}

impl DateOrder {
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Orders => DateOrder::MonthFirst,
            _ => DateOrder::IsoFirst,
        }
    }

    fn formats(self) -> [&'static str; 2] {
        match self {
            DateOrder::IsoFirst => [ISO_DATE, US_DATE],
            DateOrder::MonthFirst => [US_DATE, ISO_DATE],
        }
    }
}

pub fn parse_date(value: &str, order: DateOrder) -> Result<NaiveDate, ImportError> {
    let trimmed = value.trim();
    order
        .formats()
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ImportError::DateFormat(trimmed.to_string()))
}

fn required(row: &RawRow, columns: &[&str], field: &'static str) -> Result<String, ImportError> {
    row.text_any(columns)
        .ok_or(ImportError::MissingRequiredField(field))
}

fn required_date(
    row: &RawRow,
    columns: &[&str],
    field: &'static str,
    order: DateOrder,
) -> Result<NaiveDate, ImportError> {
    let value = required(row, columns, field)?;
    parse_date(&value, order)
}

// =============================================================================
// ORDERS
// =============================================================================

/// Order rows carry a quote flag; quotes are never imported
pub fn is_quote(row: &RawRow) -> bool {
    matches!(
        row.raw("IsQuote").map(str::trim),
        Some("1") | Some("true") | Some("True")
    )
}

pub fn order_number(row: &RawRow) -> Result<String, ImportError> {
    required(row, &["OrderNumber"], "OrderNumber")
}

/// Parsed order row. `order.customer_id` is filled in after contact resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOrder {
    pub order: NewOrder,
    pub contact: ContactFields,
}

pub fn parse_order(row: &RawRow, order_number: String) -> Result<ParsedOrder, ImportError> {
    let date = required_date(row, &["OrderDate"], "OrderDate", DateOrder::MonthFirst)?;
    let order_date = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));

    let subtotal = row.amount("SubTotalAmount");
    let discount_amount = row.amount("DiscountAmount");
    let tax = row.sum(&ORDER_TAX_COLUMNS);
    let total = row.amount("TotalAmount");
    let total_amount = if total != 0.0 {
        total
    } else {
        (subtotal + tax - discount_amount).max(0.0)
    };

    let contact = ContactFields {
        name: row.text("Contact"),
        email: row.text("ContactEmail"),
        company: row.text("ContactCompany"),
    };

    let order = NewOrder {
        order_number,
        customer_id: None,
        customer_name: contact.name.clone(),
        customer_company: contact.company.clone(),
        customer_email: contact.email.clone(),
        status: OrderStatus::from_status_id(row.raw("OrderStatusId")),
        order_date,
        due_date: order_date,
        delivery_fee: row.amount("SetupDeliveryAmount"),
        subtotal,
        tax,
        discount_amount,
        total_amount,
        event_type: row.text("EventType"),
        theme_details: row.text("ThemeDetails"),
        internal_notes: row.text("Notes"),
    };

    Ok(ParsedOrder { order, contact })
}

// =============================================================================
// OTHER ENTITIES
// =============================================================================

pub fn parse_expense(row: &RawRow) -> Result<NewExpense, ImportError> {
    let date = required_date(row, &["ExpenseDate", "Date"], "ExpenseDate", DateOrder::IsoFirst)?;
    Ok(NewExpense {
        date,
        description: row
            .text("Description")
            .unwrap_or_else(|| DEFAULT_EXPENSE_DESCRIPTION.to_string()),
        amount: row.amount("Amount"),
        category: ExpenseCategory::from_label(row.text("Category").as_deref()),
        vendor: row.text("Vendor"),
        vat_amount: row.amount("VatAmount"),
        payment_source: row.text("PaymentSource"),
    })
}

pub fn parse_mileage(row: &RawRow) -> Result<NewMileageLog, ImportError> {
    let date = required_date(row, &["Date"], "Date", DateOrder::IsoFirst)?;
    Ok(NewMileageLog {
        date,
        distance: row.amount_any(&["Miles", "Distance"]),
        purpose: row.text("Purpose"),
        order_ref: row.text("OrderRef"),
        notes: row.text("Description"),
    })
}

pub fn parse_ingredient(row: &RawRow) -> Result<NewIngredient, ImportError> {
    Ok(NewIngredient {
        name: required(row, &["Name", "IngredientName"], "Name")?,
        unit: row.text_any(&["Unit", "MeasurementShort"]),
        unit_cost: row.amount_any(&["Price", "UnitCost"]),
    })
}

pub fn parse_supply(row: &RawRow) -> Result<NewSupply, ImportError> {
    Ok(NewSupply {
        name: required(row, &["Name"], "Name")?,
        category: row.text("Category"),
        unit_cost: row.amount_any(&["Cost", "UnitCost"]),
        stock_quantity: row.amount_any(&["Quantity", "StockQuantity"]),
    })
}

// =============================================================================
// Tests
// =============================================================================
