//! Tests for order and customer deduplication

pub mod customers_tests;

use crate::app::models::{Customer, OrderLineItem};
use chrono::{TimeZone, Utc};

/// Create a valid line item; order-level fields are fixed per call
pub fn create_test_item(order_id: &str, sku_id: &str, customer_id: &str, amount: i64) -> OrderLineItem {
    OrderLineItem {
        row_number: 1,
        order_id: order_id.to_string(),
        sku_id: sku_id.to_string(),
        quantity: 1,
        customer_id: customer_id.to_string(),
        contact: None,
        ordered_at: Utc.with_ymd_and_hms(2024, 4, 10, 8, 30, 0).unwrap(),
        total_amount: amount,
    }
}

/// Create `lines` identical-header line items for one order
pub fn create_test_order(order_id: &str, customer_id: &str, amount: i64, lines: usize) -> Vec<OrderLineItem> {
    (0..lines)
        .map(|i| create_test_item(order_id, &format!("SKU-{}", i + 1), customer_id, amount))
        .collect()
}

pub fn create_test_customer(id: &str, contact: &str) -> Customer {
    Customer {
        customer_id: id.to_string(),
        name: format!("Customer {}", id),
        contact: contact.to_string(),
        region: Some("West".to_string()),
    }
}
