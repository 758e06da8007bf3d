//! Tests for the SQLite backend

use super::*;
use crate::app::services::kpi_engine::contract::Aggregates;
use crate::app::services::kpi_engine::{AggregationBackend, RelationalBackend, compute_with};
use crate::config::KpiConfig;
use uuid::Uuid;

fn create_test_snapshot(dataset: &CleanDataset, config: &KpiConfig) -> KpiSnapshot {
    compute_with(&RelationalBackend, dataset, config, Uuid::new_v4(), Utc::now()).unwrap()
}

#[test]
fn test_retail_dataset_metrics() {
    let snapshot = create_test_snapshot(&create_test_retail_dataset(), &KpiConfig::default());

    assert_eq!(snapshot.engine(), "relational");
    assert_retail_metrics(&snapshot);
}

#[test]
fn test_headers_are_derived_from_line_items() {
    let mut dataset = create_test_retail_dataset();
    dataset.headers.clear();

    let snapshot = create_test_snapshot(&dataset, &KpiConfig::default());

    assert_retail_metrics(&snapshot);
}

#[test]
fn test_order_headers_view_excludes_inconsistent_orders() {
    let dataset = create_test_dataset_with_inconsistent_order();
    let conn = RelationalBackend::load(&dataset).unwrap();

    let excluded: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM order_headers WHERE order_id = 'O6'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let headers: i64 = conn
        .query_row("SELECT COUNT(*) FROM order_headers", [], |row| row.get(0))
        .unwrap();
    let kept_lines: i64 = conn
        .query_row("SELECT COUNT(*) FROM kept_lines", [], |row| row.get(0))
        .unwrap();

    assert_eq!(excluded, 0);
    assert_eq!(headers, 5);
    assert_eq!(kept_lines, 8);

    assert_retail_metrics(&create_test_snapshot(&dataset, &KpiConfig::default()));
}

#[test]
fn test_unknown_customer_orders_keep_their_revenue() {
    let aggregates = RelationalBackend
        .aggregate(&create_test_retail_dataset(), &KpiConfig::default())
        .unwrap()
        .canonicalize();

    let orphan = aggregates
        .customers
        .iter()
        .find(|c| c.customer_id == "C9")
        .unwrap();
    assert_eq!(orphan.order_count, 1);
    assert_eq!(orphan.revenue, 50_000);

    let idle = aggregates
        .customers
        .iter()
        .find(|c| c.customer_id == "C4")
        .unwrap();
    assert_eq!(idle.order_count, 0);
    assert_eq!(idle.revenue, 0);

    let region_revenue: i64 = aggregates.regions.iter().map(|r| r.revenue).sum();
    assert_eq!(region_revenue, aggregates.total_revenue);
}

#[test]
fn test_empty_dataset_yields_zero_and_null() {
    let aggregates = RelationalBackend
        .aggregate(&CleanDataset::default(), &KpiConfig::default())
        .unwrap();

    assert_eq!(aggregates, Aggregates::default());
}

#[test]
fn test_months_follow_configured_offset() {
    let config = KpiConfig {
        utc_offset_minutes: -60,
        ..KpiConfig::default()
    };

    let snapshot = create_test_snapshot(&create_test_retail_dataset(), &config);

    assert_eq!(
        table_column(&snapshot, Metric::MonthlyTrend, "revenue"),
        vec![
            MetricValue::Integer(300_000),
            MetricValue::Integer(900_000),
            MetricValue::Integer(50_000)
        ]
    );
}

#[test]
fn test_weekdays_and_hours_follow_configured_offset() {
    let config = KpiConfig {
        utc_offset_minutes: -60,
        ..KpiConfig::default()
    };

    let snapshot = create_test_snapshot(&create_test_retail_dataset(), &config);

    // O4 moves to Thursday 2024-02-29 23:30 local time
    assert_eq!(
        text_column(&snapshot, Metric::WeekdayBreakdown, "weekday"),
        vec!["Monday", "Tuesday", "Thursday", "Saturday"]
    );
    assert_eq!(
        table_column(&snapshot, Metric::HourlyBreakdown, "hour"),
        [8, 9, 11, 13, 23].map(MetricValue::Integer).to_vec()
    );
    assert_eq!(snapshot.get(Metric::BusiestWeekday).as_str(), Some("Tuesday"));
    assert_eq!(snapshot.get(Metric::BusiestHour).as_i64(), Some(8));
}
