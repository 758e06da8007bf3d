//! Tests for metric derivation from aggregates

use super::*;
use crate::app::services::kpi_engine::contract::{
    Aggregates, CustomerAggregate, HourAggregate, ProductAggregate, RegionAggregate,
    WeekdayAggregate, build_snapshot, ratio, region_buckets,
};
use crate::app::services::kpi_engine::Segment;
use crate::config::KpiConfig;
use uuid::Uuid;

fn create_test_customer_aggregate(id: &str, order_count: i64, revenue: i64) -> CustomerAggregate {
    CustomerAggregate {
        customer_id: id.to_string(),
        name: Some(format!("Customer {}", id)),
        region: None,
        order_count,
        revenue,
    }
}

/// An id seen on orders but missing from the customer table
fn create_test_unlisted_aggregate(id: &str, order_count: i64, revenue: i64) -> CustomerAggregate {
    CustomerAggregate {
        name: None,
        ..create_test_customer_aggregate(id, order_count, revenue)
    }
}

fn create_test_region(region: Option<&str>, order_count: i64, revenue: i64) -> RegionAggregate {
    RegionAggregate {
        region: region.map(str::to_string),
        order_count,
        revenue,
    }
}

fn create_test_snapshot(aggregates: Aggregates, config: &KpiConfig) -> KpiSnapshot {
    build_snapshot(aggregates, config, Uuid::new_v4(), Utc::now(), "test").unwrap()
}

#[test]
fn test_segment_thresholds() {
    let config = KpiConfig::default();

    assert_eq!(Segment::classify(3, 0, &config), Segment::Vip);
    assert_eq!(Segment::classify(2, 1_000_001, &config), Segment::Vip);
    assert_eq!(Segment::classify(2, 1_000_000, &config), Segment::Regular);
    assert_eq!(Segment::classify(1, 500_001, &config), Segment::Premium);
    assert_eq!(Segment::classify(1, 500_000, &config), Segment::Regular);
    assert_eq!(Segment::classify(1, 2_000_000, &config), Segment::Vip);
    assert_eq!(Segment::classify(0, 0, &config), Segment::Regular);
}

#[test]
fn test_ratio_with_zero_denominator_is_null() {
    assert_eq!(ratio(5, 0), MetricValue::Null);
    assert_eq!(ratio(0, 4), MetricValue::Decimal(0.0));
    assert_eq!(ratio(1, 4), MetricValue::Decimal(0.25));
}

#[test]
fn test_region_buckets_merge_unknown() {
    let buckets = region_buckets(&[
        create_test_region(Some("North"), 2, 400),
        create_test_region(None, 1, 100),
        create_test_region(Some("Unknown"), 1, 50),
        create_test_region(Some("East"), 3, 400),
    ]);

    assert_eq!(
        buckets,
        vec![
            ("East".to_string(), 3, 400),
            ("North".to_string(), 2, 400),
            ("Unknown".to_string(), 2, 150),
        ]
    );
}

#[test]
fn test_top_customers_break_ties_by_id() {
    let aggregates = Aggregates {
        customer_count: 4,
        order_count: 4,
        total_revenue: 400,
        customers: vec![
            create_test_customer_aggregate("C3", 1, 100),
            create_test_customer_aggregate("C1", 1, 100),
            create_test_customer_aggregate("C2", 2, 200),
            create_test_customer_aggregate("C4", 0, 0),
        ],
        ..Aggregates::default()
    };
    let config = KpiConfig {
        top_n: 2,
        ..KpiConfig::default()
    };

    let snapshot = create_test_snapshot(aggregates, &config);

    assert_eq!(
        text_column(&snapshot, Metric::TopCustomers, "customer_id"),
        vec!["C2", "C1"]
    );
}

#[test]
fn test_top_products_break_ties_by_sku() {
    let product = |sku: &str, quantity: i64| ProductAggregate {
        sku_id: sku.to_string(),
        quantity,
        order_count: 1,
    };
    let aggregates = Aggregates {
        products: vec![product("SKU-Z", 5), product("SKU-M", 7), product("SKU-A", 5)],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(
        text_column(&snapshot, Metric::TopProducts, "sku_id"),
        vec!["SKU-M", "SKU-A", "SKU-Z"]
    );
}

#[test]
fn test_grouped_row_order_does_not_change_snapshot() {
    let forward = Aggregates {
        customer_count: 2,
        customers: vec![
            create_test_customer_aggregate("C1", 1, 10),
            create_test_customer_aggregate("C2", 3, 30),
        ],
        regions: vec![
            create_test_region(Some("North"), 1, 10),
            create_test_region(None, 3, 30),
        ],
        ..Aggregates::default()
    };
    let mut reversed = forward.clone();
    reversed.customers.reverse();
    reversed.regions.reverse();

    let config = KpiConfig::default();
    let a = create_test_snapshot(forward, &config);
    let b = create_test_snapshot(reversed, &config);

    assert!(a.same_values(&b));
}

#[test]
fn test_segment_table_covers_every_customer() {
    let aggregates = Aggregates {
        customer_count: 3,
        customers: vec![
            create_test_customer_aggregate("C1", 4, 100),
            create_test_customer_aggregate("C2", 1, 600_000),
            create_test_customer_aggregate("C3", 0, 0),
        ],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(
        text_column(&snapshot, Metric::CustomerSegments, "segment"),
        vec!["VIP", "Premium", "Regular"]
    );
    assert_eq!(snapshot.get(Metric::VipCustomers).as_i64(), Some(1));
    assert_eq!(snapshot.get(Metric::PremiumCustomers).as_i64(), Some(1));
    assert_eq!(snapshot.get(Metric::RegularCustomers).as_i64(), Some(1));
    assert_eq!(snapshot.get(Metric::ActiveCustomers).as_i64(), Some(2));
}

#[test]
fn test_repeat_customers_only_count_listed_customers() {
    let aggregates = Aggregates {
        customer_count: 1,
        customers: vec![
            create_test_customer_aggregate("C1", 2, 200),
            create_test_unlisted_aggregate("X1", 3, 300),
            create_test_unlisted_aggregate("X2", 2, 200),
        ],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(snapshot.get(Metric::RepeatCustomers).as_i64(), Some(1));
    assert_eq!(snapshot.get(Metric::RepeatRate), &MetricValue::Decimal(1.0));
    assert_eq!(snapshot.get(Metric::ActiveCustomers).as_i64(), Some(3));
}

#[test]
fn test_repeat_rate_stays_within_unit_interval() {
    let aggregates = Aggregates {
        customer_count: 2,
        customers: vec![
            create_test_customer_aggregate("C1", 1, 100),
            create_test_customer_aggregate("C2", 0, 0),
            create_test_unlisted_aggregate("X1", 2, 200),
            create_test_unlisted_aggregate("X2", 2, 200),
            create_test_unlisted_aggregate("X3", 4, 400),
        ],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(snapshot.get(Metric::RepeatCustomers).as_i64(), Some(0));
    assert_eq!(snapshot.get(Metric::RepeatRate), &MetricValue::Decimal(0.0));
}

#[test]
fn test_busiest_weekday_and_hour_break_ties_by_smallest_key() {
    let weekday = |weekday: u32, order_count: i64| WeekdayAggregate { weekday, order_count };
    let hour = |hour: u32, order_count: i64| HourAggregate { hour, order_count };
    let aggregates = Aggregates {
        weekdays: vec![weekday(4, 2), weekday(1, 2), weekday(6, 1)],
        hours: vec![hour(23, 3), hour(7, 3), hour(12, 1)],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(snapshot.get(Metric::BusiestWeekday).as_str(), Some("Tuesday"));
    assert_eq!(snapshot.get(Metric::BusiestHour).as_i64(), Some(7));
    assert_eq!(
        text_column(&snapshot, Metric::WeekdayBreakdown, "weekday"),
        vec!["Tuesday", "Friday", "Sunday"]
    );
    assert_eq!(
        table_column(&snapshot, Metric::HourlyBreakdown, "hour"),
        [7, 12, 23].map(MetricValue::Integer).to_vec()
    );
}

#[test]
fn test_busiest_without_orders_is_null() {
    let snapshot = create_test_snapshot(Aggregates::default(), &KpiConfig::default());

    assert!(snapshot.get(Metric::BusiestWeekday).is_null());
    assert!(snapshot.get(Metric::BusiestHour).is_null());
    assert_eq!(
        snapshot.get(Metric::WeekdayBreakdown).as_table().map(<[_]>::len),
        Some(0)
    );
}

#[test]
fn test_top_customers_carry_name_and_region() {
    let aggregates = Aggregates {
        customer_count: 1,
        customers: vec![
            CustomerAggregate {
                region: Some("North".to_string()),
                ..create_test_customer_aggregate("C1", 1, 500)
            },
            create_test_unlisted_aggregate("X1", 1, 900),
        ],
        ..Aggregates::default()
    };

    let snapshot = create_test_snapshot(aggregates, &KpiConfig::default());

    assert_eq!(
        table_column(&snapshot, Metric::TopCustomers, "customer_name"),
        vec![MetricValue::Null, MetricValue::from("Customer C1")]
    );
    assert_eq!(
        text_column(&snapshot, Metric::TopCustomers, "region"),
        vec!["Unknown", "North"]
    );
}
