//! Tests for customer collapse

use super::*;
use crate::app::models::quality_log::ValidationReason;
use crate::app::services::deduplicator::collapse_customers;

#[test]
fn test_unique_customers_unchanged() {
    let customers = vec![create_test_customer("C1", "111"), create_test_customer("C2", "222")];

    let result = collapse_customers(customers.clone());

    assert_eq!(result.customers, customers);
    assert!(result.rejected.is_empty());
    assert!(result.conflicts.is_empty());
}

#[test]
fn test_repeated_id_last_write_wins() {
    let mut updated = create_test_customer("C1", "111");
    updated.region = Some("East".to_string());
    updated.name = "Renamed".to_string();

    let result = collapse_customers(vec![
        create_test_customer("C1", "111"),
        create_test_customer("C2", "222"),
        updated,
    ]);

    assert_eq!(result.customers.len(), 2);
    assert_eq!(result.customers[0].customer_id, "C1");
    assert_eq!(result.customers[0].region.as_deref(), Some("East"));
    assert_eq!(result.customers[0].name, "Renamed");
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].reason, ValidationReason::DuplicateKey);
}

#[test]
fn test_contact_conflict_first_seen_wins() {
    let result = collapse_customers(vec![
        create_test_customer("C1", "111"),
        create_test_customer("C2", "111"),
    ]);

    assert_eq!(result.customers.len(), 1);
    assert_eq!(result.customers[0].customer_id, "C1");
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].kept_customer_id, "C1");
    assert_eq!(result.conflicts[0].rejected_customer_id, "C2");
    assert_eq!(result.rejected[0].record_id, "C2");
}

#[test]
fn test_contact_released_after_update() {
    // C1 moves to a new number, so 111 becomes free for C2
    let result = collapse_customers(vec![
        create_test_customer("C1", "111"),
        create_test_customer("C1", "333"),
        create_test_customer("C2", "111"),
    ]);

    assert_eq!(result.customers.len(), 2);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.customers[0].contact, "333");
}

#[test]
fn test_collapse_counts_balance() {
    let input = vec![
        create_test_customer("C1", "111"),
        create_test_customer("C1", "111"),
        create_test_customer("C2", "111"),
        create_test_customer("C3", "333"),
    ];
    let total = input.len();

    let result = collapse_customers(input);
    assert_eq!(result.customers.len() + result.rejected.len(), total);
}
