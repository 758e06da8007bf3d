//! Tests for record normalization
//!
//! Shared fixtures for raw rows live here; each component has its own file.


use super::RecordNormalizer;
use crate::app::models::{RawCustomerRow, RawOrderRow};
use crate::config::KpiConfig;

/// Create a normalizer with a UTC offset in minutes
pub fn create_test_normalizer(utc_offset_minutes: i32) -> RecordNormalizer {
    let config = KpiConfig {
        utc_offset_minutes,
        ..KpiConfig::default()
    };
    RecordNormalizer::new(&config).unwrap()
}

/// Create a fully populated raw customer row
pub fn create_test_customer_row(id: &str, contact: &str, region: &str) -> RawCustomerRow {
    RawCustomerRow {
        customer_id: Some(id.to_string()),
        customer_name: Some(format!("Customer {}", id)),
        mobile_number: Some(contact.to_string()),
        region: Some(region.to_string()),
    }
}

/// Create a fully populated raw order row
pub fn create_test_order_row(order_id: &str, customer_id: &str, sku_id: &str) -> RawOrderRow {
    RawOrderRow {
        order_id: Some(order_id.to_string()),
        customer_id: Some(customer_id.to_string()),
        mobile_number: Some("98765 43210".to_string()),
        order_date_time: Some("2024-03-15 14:30:00".to_string()),
        total_amount: Some("1250.50".to_string()),
        sku_id: Some(sku_id.to_string()),
        sku_count: Some("2".to_string()),
    }
}
