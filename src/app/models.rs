//! Data models for the order KPI pipeline
//!
//! Records move through three shapes: raw rows exactly as a source delivered
//! them, normalized records whose typed fields may still be missing or
//! malformed, and validated entities that downstream stages can trust.
//! Money is carried as `i64` minor currency units throughout.

pub mod quality_log;
pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Normalized field values
// =============================================================================

/// Outcome of normalizing one typed field
///
/// Unparseable input is kept as `Malformed` with its raw text so the validator
/// can reject it with a reason; it is never coerced into a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue<T> {
    Present(T),
    Missing,
    Malformed(String),
}

impl<T> FieldValue<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldValue::Malformed(_))
    }

    /// Borrow the parsed value, if any
    pub fn present(&self) -> Option<&T> {
        match self {
            FieldValue::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Raw text of a malformed value
    pub fn raw(&self) -> Option<&str> {
        match self {
            FieldValue::Malformed(raw) => Some(raw),
            _ => None,
        }
    }
}

impl<T: Copy> FieldValue<T> {
    pub fn value(&self) -> Option<T> {
        self.present().copied()
    }
}

// =============================================================================
// Raw source rows
// =============================================================================

/// A customer row as delivered by the customer source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCustomerRow {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub region: Option<String>,
}

/// An order line-item row as delivered by the order source
///
/// One row per SKU per order; order-level fields repeat on every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrderRow {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub mobile_number: Option<String>,
    pub order_date_time: Option<String>,
    pub total_amount: Option<String>,
    pub sku_id: Option<String>,
    pub sku_count: Option<String>,
}

// =============================================================================
// Normalized records
// =============================================================================

/// Customer after normalization, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// 1-based position in the source
    pub row_number: usize,
    pub customer_id: Option<String>,
    pub name: String,
    pub contact: Option<String>,
    pub region: Option<String>,
}

impl CustomerRecord {
    /// Identifier used in quality logs
    pub fn record_id(&self) -> String {
        self.customer_id
            .clone()
            .unwrap_or_else(|| format!("row {}", self.row_number))
    }
}

/// Order line after normalization, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    /// 1-based position in the source
    pub row_number: usize,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub contact: Option<String>,
    pub sku_id: Option<String>,
    pub quantity: FieldValue<i64>,
    pub total_amount: FieldValue<i64>,
    pub ordered_at: FieldValue<DateTime<Utc>>,
}

impl OrderLineRecord {
    /// Identifier used in quality logs
    pub fn record_id(&self) -> String {
        match (&self.order_id, &self.sku_id) {
            (Some(order), Some(sku)) => format!("{}/{}", order, sku),
            (Some(order), None) => order.clone(),
            _ => format!("row {}", self.row_number),
        }
    }
}

// =============================================================================
// Validated entities
// =============================================================================

/// A valid customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    /// Normalized contact number, unique across customers
    pub contact: String,
    /// Title-cased region, `None` when the source had none
    pub region: Option<String>,
}

/// A valid order line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub row_number: usize,
    pub order_id: String,
    pub sku_id: String,
    pub quantity: i64,
    pub customer_id: String,
    pub contact: Option<String>,
    pub ordered_at: DateTime<Utc>,
    /// Order total in minor units, repeated on every line of the order
    pub total_amount: i64,
}

/// One order, derived from its consistent line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_id: String,
    pub customer_id: String,
    pub ordered_at: DateTime<Utc>,
    pub total_amount: i64,
    pub line_count: usize,
}

impl OrderHeader {
    /// Build a header from the first line of a consistent group
    pub fn from_line(line: &OrderLineItem, line_count: usize) -> Self {
        Self {
            order_id: line.order_id.clone(),
            customer_id: line.customer_id.clone(),
            ordered_at: line.ordered_at,
            total_amount: line.total_amount,
            line_count,
        }
    }
}

/// Engine input: everything a KPI backend may read
///
/// `items` may include lines of orders that have no header; every backend
/// ignores those lines.
#[derive(Debug, Clone, Default)]
pub struct CleanDataset {
    pub customers: Vec<Customer>,
    pub headers: Vec<OrderHeader>,
    pub items: Vec<OrderLineItem>,
}

impl CleanDataset {
    pub fn new(
        customers: Vec<Customer>,
        headers: Vec<OrderHeader>,
        items: Vec<OrderLineItem>,
    ) -> Self {
        Self {
            customers,
            headers,
            items,
        }
    }

    /// Newest order timestamp, used by the freshness check
    pub fn last_order_at(&self) -> Option<DateTime<Utc>> {
        self.headers.iter().map(|h| h.ordered_at).max()
    }
}
