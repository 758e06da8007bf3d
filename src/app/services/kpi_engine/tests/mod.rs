//! Tests for the KPI engines and their shared contract

pub mod contract_tests;
pub mod relational_tests;

use crate::app::models::snapshot::{KpiSnapshot, Metric, MetricValue};
use crate::app::models::{CleanDataset, Customer, OrderLineItem};
use crate::app::services::deduplicator::dedupe;
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn create_test_customer(id: &str, region: Option<&str>) -> Customer {
    Customer {
        customer_id: id.to_string(),
        name: format!("Customer {}", id),
        contact: format!("+1555000{}", id),
        region: region.map(str::to_string),
    }
}

pub fn create_test_time(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, hour, minute, 0).unwrap()
}

/// Line items for one order; `lines` is (sku_id, quantity)
pub fn create_test_order_lines(
    order_id: &str,
    customer_id: &str,
    ordered_at: DateTime<Utc>,
    amount: i64,
    lines: &[(&str, i64)],
) -> Vec<OrderLineItem> {
    lines
        .iter()
        .enumerate()
        .map(|(i, (sku_id, quantity))| OrderLineItem {
            row_number: i + 1,
            order_id: order_id.to_string(),
            sku_id: sku_id.to_string(),
            quantity: *quantity,
            customer_id: customer_id.to_string(),
            contact: None,
            ordered_at,
            total_amount: amount,
        })
        .collect()
}

/// Headers from the deduplicator, items as given
pub fn create_test_dataset(customers: Vec<Customer>, items: Vec<OrderLineItem>) -> CleanDataset {
    let headers = dedupe(&items).headers;
    CleanDataset::new(customers, headers, items)
}

/// Four customers, five orders, eight line items
///
/// - C1 (North): O1 300_000 (SKU-A x2, SKU-B x1), O2 200_000 (SKU-A x1)
/// - C2 (South): O3 600_000 (SKU-C x3, SKU-A x1, SKU-B x1)
/// - C3 (no region): O4 100_000 (SKU-B x4) at 2024-03-01 00:30Z
/// - C4 (North): no orders
/// - C9 (not in the customer table): O5 50_000 (SKU-D x1)
pub fn create_test_retail_lines() -> Vec<OrderLineItem> {
    let mut items = Vec::new();
    items.extend(create_test_order_lines(
        "O1",
        "C1",
        create_test_time(1, 15, 10, 0),
        300_000,
        &[("SKU-A", 2), ("SKU-B", 1)],
    ));
    items.extend(create_test_order_lines(
        "O2",
        "C1",
        create_test_time(2, 3, 12, 0),
        200_000,
        &[("SKU-A", 1)],
    ));
    items.extend(create_test_order_lines(
        "O3",
        "C2",
        create_test_time(2, 20, 9, 0),
        600_000,
        &[("SKU-C", 3), ("SKU-A", 1), ("SKU-B", 1)],
    ));
    items.extend(create_test_order_lines(
        "O4",
        "C3",
        create_test_time(3, 1, 0, 30),
        100_000,
        &[("SKU-B", 4)],
    ));
    items.extend(create_test_order_lines(
        "O5",
        "C9",
        create_test_time(3, 5, 14, 0),
        50_000,
        &[("SKU-D", 1)],
    ));
    items
}

pub fn create_test_retail_customers() -> Vec<Customer> {
    vec![
        create_test_customer("C1", Some("North")),
        create_test_customer("C2", Some("South")),
        create_test_customer("C3", None),
        create_test_customer("C4", Some("North")),
    ]
}

pub fn create_test_retail_dataset() -> CleanDataset {
    create_test_dataset(create_test_retail_customers(), create_test_retail_lines())
}

/// The retail dataset plus O6, whose lines disagree on the order total
pub fn create_test_dataset_with_inconsistent_order() -> CleanDataset {
    let mut items = create_test_retail_lines();
    let at = create_test_time(2, 10, 8, 0);
    items.extend(create_test_order_lines("O6", "C2", at, 900_000, &[("SKU-E", 5)]));
    items.extend(create_test_order_lines("O6", "C2", at, 950_000, &[("SKU-F", 2)]));
    create_test_dataset(create_test_retail_customers(), items)
}

/// One known customer with one order, and two ids missing from the customer
/// table with two orders each
pub fn create_test_dataset_with_unlisted_repeat_buyers() -> CleanDataset {
    let mut items = create_test_order_lines(
        "O1",
        "C1",
        create_test_time(4, 1, 9, 0),
        10_000,
        &[("SKU-A", 1)],
    );
    for (index, customer_id) in ["X1", "X1", "X2", "X2"].iter().enumerate() {
        items.extend(create_test_order_lines(
            &format!("O{}", index + 2),
            customer_id,
            create_test_time(4, index as u32 + 2, 9, 0),
            20_000,
            &[("SKU-B", 1)],
        ));
    }
    create_test_dataset(vec![create_test_customer("C1", Some("North"))], items)
}

/// Retail dataset plus two orders whose lines differ only below one second
///
/// O7 lines are 100ms apart and must be excluded; O8 lines differ by less
/// than a millisecond and must be kept.
pub fn create_test_dataset_with_sub_second_times() -> CleanDataset {
    let at = create_test_time(4, 10, 18, 45);
    let mut items = create_test_retail_lines();
    items.extend(create_test_order_lines(
        "O7",
        "C1",
        at + Duration::milliseconds(100),
        70_000,
        &[("SKU-A", 1)],
    ));
    items.extend(create_test_order_lines(
        "O7",
        "C1",
        at + Duration::milliseconds(200),
        70_000,
        &[("SKU-B", 1)],
    ));
    items.extend(create_test_order_lines(
        "O8",
        "C2",
        at + Duration::microseconds(100_100),
        80_000,
        &[("SKU-A", 1)],
    ));
    items.extend(create_test_order_lines(
        "O8",
        "C2",
        at + Duration::microseconds(100_900),
        80_000,
        &[("SKU-C", 2)],
    ));
    create_test_dataset(create_test_retail_customers(), items)
}

/// Column `key` of every row in a table metric
pub fn table_column(snapshot: &KpiSnapshot, metric: Metric, key: &str) -> Vec<MetricValue> {
    snapshot
        .get(metric)
        .as_table()
        .unwrap()
        .iter()
        .map(|row| row[key].clone())
        .collect()
}

pub fn text_column(snapshot: &KpiSnapshot, metric: Metric, key: &str) -> Vec<String> {
    table_column(snapshot, metric, key)
        .into_iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

/// Every metric of the retail dataset at UTC with default thresholds
pub fn assert_retail_metrics(snapshot: &KpiSnapshot) {
    let int = |metric: Metric| snapshot.get(metric).as_i64().unwrap();
    let dec = |metric: Metric| snapshot.get(metric).as_f64().unwrap();

    assert_eq!(int(Metric::TotalCustomers), 4);
    assert_eq!(int(Metric::ActiveCustomers), 4);
    assert_eq!(int(Metric::RepeatCustomers), 1);
    assert_eq!(dec(Metric::RepeatRate), 0.25);
    assert_eq!(dec(Metric::AvgOrdersPerActiveCustomer), 1.25);
    assert_eq!(dec(Metric::AvgRevenuePerActiveCustomer), 312_500.0);
    assert_eq!(int(Metric::VipCustomers), 0);
    assert_eq!(int(Metric::PremiumCustomers), 1);
    assert_eq!(int(Metric::RegularCustomers), 4);

    assert_eq!(int(Metric::TotalOrders), 5);
    assert_eq!(int(Metric::TotalLineItems), 8);
    assert_eq!(dec(Metric::AvgLineItemsPerOrder), 1.6);
    assert_eq!(dec(Metric::AvgOrderValue), 250_000.0);
    assert_eq!(int(Metric::MinOrderValue), 50_000);
    assert_eq!(int(Metric::MaxOrderValue), 600_000);

    assert_eq!(int(Metric::TotalRevenue), 1_250_000);
    assert_eq!(int(Metric::TotalItemsSold), 14);
    assert_eq!(dec(Metric::AvgRevenuePerItem), 1_250_000.0 / 14.0);

    assert_eq!(int(Metric::UniqueSkus), 4);
    assert_eq!(
        text_column(snapshot, Metric::TopProducts, "sku_id"),
        vec!["SKU-B", "SKU-A", "SKU-C", "SKU-D"]
    );

    assert_eq!(int(Metric::RegionsCount), 3);
    assert_eq!(
        text_column(snapshot, Metric::RevenueByRegion, "region"),
        vec!["South", "North", "Unknown"]
    );
    assert_eq!(
        table_column(snapshot, Metric::RevenueByRegion, "revenue"),
        vec![
            MetricValue::Integer(600_000),
            MetricValue::Integer(500_000),
            MetricValue::Integer(150_000)
        ]
    );

    assert_eq!(
        text_column(snapshot, Metric::MonthlyTrend, "month"),
        vec!["2024-01", "2024-02", "2024-03"]
    );
    assert_eq!(
        snapshot.get(Metric::FirstOrderAt).as_str(),
        Some("2024-01-15T10:00:00+00:00")
    );
    assert_eq!(
        snapshot.get(Metric::LastOrderAt).as_str(),
        Some("2024-03-05T14:00:00+00:00")
    );
    assert_eq!(
        text_column(snapshot, Metric::WeekdayBreakdown, "weekday"),
        vec!["Monday", "Tuesday", "Friday", "Saturday"]
    );
    assert_eq!(
        table_column(snapshot, Metric::WeekdayBreakdown, "order_count"),
        vec![
            MetricValue::Integer(1),
            MetricValue::Integer(2),
            MetricValue::Integer(1),
            MetricValue::Integer(1)
        ]
    );
    assert_eq!(
        table_column(snapshot, Metric::HourlyBreakdown, "hour"),
        [0, 9, 10, 12, 14].map(MetricValue::Integer).to_vec()
    );
    assert_eq!(snapshot.get(Metric::BusiestWeekday).as_str(), Some("Tuesday"));
    assert_eq!(int(Metric::BusiestHour), 0);

    assert_eq!(
        text_column(snapshot, Metric::TopCustomers, "customer_id"),
        vec!["C2", "C1", "C3", "C9"]
    );
    assert_eq!(
        text_column(snapshot, Metric::TopCustomers, "region"),
        vec!["South", "North", "Unknown", "Unknown"]
    );
    assert_eq!(
        table_column(snapshot, Metric::TopCustomers, "customer_name"),
        vec![
            MetricValue::from("Customer C2"),
            MetricValue::from("Customer C1"),
            MetricValue::from("Customer C3"),
            MetricValue::Null
        ]
    );
}
