//! Tests for record validation


use crate::app::models::{CustomerRecord, FieldValue, OrderLineRecord};
use chrono::{TimeZone, Utc};

/// Create a customer record that passes validation
pub fn create_test_customer_record(row_number: usize, id: &str, contact: &str) -> CustomerRecord {
    CustomerRecord {
        row_number,
        customer_id: Some(id.to_string()),
        name: format!("Customer {}", id),
        contact: Some(contact.to_string()),
        region: Some("North".to_string()),
    }
}

/// Create an order line record that passes validation
pub fn create_test_line_record(row_number: usize, order_id: &str, sku_id: &str) -> OrderLineRecord {
    OrderLineRecord {
        row_number,
        order_id: Some(order_id.to_string()),
        customer_id: Some("C1".to_string()),
        contact: Some("9000000001".to_string()),
        sku_id: Some(sku_id.to_string()),
        quantity: FieldValue::Present(1),
        total_amount: FieldValue::Present(10_000),
        ordered_at: FieldValue::Present(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()),
    }
}
