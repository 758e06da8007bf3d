//! Tests for pipeline orchestration and freshness


use super::PipelineRunner;
use crate::app::models::{RawCustomerRow, RawOrderRow};
use crate::config::PipelineConfig;
use chrono::{DateTime, TimeZone, Utc};

pub const SCENARIO_REVENUE: i64 = 550_000;

pub fn create_test_runner() -> PipelineRunner {
    PipelineRunner::new(PipelineConfig::default())
}

pub fn create_test_run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
}

pub fn create_test_contact(index: usize) -> String {
    format!("98765 4321{}", index)
}

pub fn create_test_customer_row(index: usize, region: &str) -> RawCustomerRow {
    RawCustomerRow {
        customer_id: Some(format!("C{}", index)),
        customer_name: Some(format!("customer {}", index)),
        mobile_number: Some(create_test_contact(index)),
        region: Some(region.to_string()),
    }
}

/// A line of order `O{order}`; header fields depend only on the order number
pub fn create_test_line_row(order: usize, sku_id: &str) -> RawOrderRow {
    let customer = (order - 1) % 5 + 1;
    RawOrderRow {
        order_id: Some(format!("O{}", order)),
        customer_id: Some(format!("C{}", customer)),
        mobile_number: Some(create_test_contact(customer)),
        order_date_time: Some(format!("2024-03-{:02} 10:00:00", order)),
        total_amount: Some(format!("{}.00", order * 100)),
        sku_id: Some(sku_id.to_string()),
        sku_count: Some("1".to_string()),
    }
}

pub fn create_test_scenario_customers() -> Vec<RawCustomerRow> {
    vec![
        create_test_customer_row(1, "north"),
        create_test_customer_row(2, "South"),
        create_test_customer_row(3, "EAST"),
        create_test_customer_row(4, " "),
        create_test_customer_row(5, "west"),
    ]
}

/// Ten orders of two valid lines each, plus two invalid lines in O1 and O2
///
/// Order `k` belongs to customer `(k - 1) % 5 + 1` and totals `k * 100.00`.
pub fn create_test_scenario_orders() -> Vec<RawOrderRow> {
    let mut rows = Vec::new();
    for order in 1..=10 {
        rows.push(create_test_line_row(order, "SKU-A"));
        rows.push(create_test_line_row(order, &format!("SKU-{}", order)));
    }

    let mut zero_quantity = create_test_line_row(1, "SKU-Z");
    zero_quantity.sku_count = Some("0".to_string());
    rows.insert(1, zero_quantity);

    let mut missing_sku = create_test_line_row(2, "SKU-Z");
    missing_sku.sku_id = None;
    rows.push(missing_sku);

    rows
}
