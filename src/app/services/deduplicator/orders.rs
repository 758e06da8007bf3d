//! Order header derivation from line items

use crate::app::models::quality_log::{RecordKind, ValidationIssue, ValidationReason};
use crate::app::models::{OrderHeader, OrderLineItem};
use chrono::SecondsFormat;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// One order-level field that differs across an order's lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDivergence {
    pub field: &'static str,
    /// Distinct values in first-seen order
    pub values: Vec<String>,
}

/// An order whose lines disagree on order-level fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub order_id: String,
    pub line_count: usize,
    pub divergences: Vec<FieldDivergence>,
}

impl IntegrityViolation {
    /// Quality log entry for the excluded order
    pub fn to_issue(&self) -> ValidationIssue {
        let detail = self
            .divergences
            .iter()
            .map(|d| format!("{} differs: [{}]", d.field, d.values.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        ValidationIssue::new(
            RecordKind::Order,
            self.order_id.clone(),
            None,
            ValidationReason::InconsistentOrderHeader,
            format!("{} ({} lines excluded)", detail, self.line_count),
        )
    }
}

/// Result of deduplicating valid line items
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One header per consistent order, in first-seen order
    pub headers: Vec<OrderHeader>,
    /// Line items of consistent orders, unchanged
    pub items: Vec<OrderLineItem>,
    pub violations: Vec<IntegrityViolation>,
}

impl DedupOutcome {
    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.violations.iter().map(IntegrityViolation::to_issue).collect()
    }

    pub fn excluded_line_count(&self) -> usize {
        self.violations.iter().map(|v| v.line_count).sum()
    }

    pub fn revenue(&self) -> i64 {
        self.headers.iter().map(|h| h.total_amount).sum()
    }
}

/// Derive order headers from valid line items
///
/// 1. Group line items by order id, keeping first-seen order
/// 2. Verify customer id, timestamp and total amount agree within each group
/// 3. Emit one header per consistent group from its first line
/// 4. Pass the group's line items through unchanged
pub fn dedupe(items: &[OrderLineItem]) -> DedupOutcome {
    let groups = group_by_order(items);
    let mut outcome = DedupOutcome::default();

    for group in groups {
        let divergences = find_divergences(&group);
        let first = group[0];

        if divergences.is_empty() {
            if group.len() > 1 {
                debug!(
                    "Order {}: collapsed {} line items into one header",
                    first.order_id,
                    group.len()
                );
            }
            outcome.headers.push(OrderHeader::from_line(first, group.len()));
            outcome.items.extend(group.into_iter().cloned());
        } else {
            let violation = IntegrityViolation {
                order_id: first.order_id.clone(),
                line_count: group.len(),
                divergences,
            };
            error!(
                "Order {} excluded: {}",
                violation.order_id,
                violation.to_issue().detail
            );
            outcome.violations.push(violation);
        }
    }

    info!(
        "Deduplication complete: {} line items -> {} order headers, {} orders excluded",
        items.len(),
        outcome.headers.len(),
        outcome.violations.len()
    );

    outcome
}

/// Group line items by order id, preserving first-seen order of orders and lines
fn group_by_order(items: &[OrderLineItem]) -> Vec<Vec<&OrderLineItem>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&OrderLineItem>> = Vec::new();

    for item in items {
        match index.get(item.order_id.as_str()) {
            Some(&position) => groups[position].push(item),
            None => {
                index.insert(item.order_id.as_str(), groups.len());
                groups.push(vec![item]);
            }
        }
    }

    groups
}

/// Order times compare at millisecond precision, the resolution the KPI
/// engines store
fn find_divergences(group: &[&OrderLineItem]) -> Vec<FieldDivergence> {
    let checks: [(&'static str, fn(&OrderLineItem) -> String); 3] = [
        ("customer_id", |item| item.customer_id.clone()),
        ("order_date_time", |item| {
            item.ordered_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        }),
        ("total_amount", |item| item.total_amount.to_string()),
    ];

    checks
        .iter()
        .filter_map(|(field, extract)| {
            let mut values: Vec<String> = Vec::new();
            for item in group {
                let value = extract(item);
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            (values.len() > 1).then_some(FieldDivergence {
                field: *field,
                values,
            })
        })
        .collect()
}

/// How much a line-level sum would overstate revenue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanOutReport {
    pub line_items: usize,
    pub orders: usize,
    /// Line items per order, `None` without orders
    pub factor: Option<f64>,
    /// Sum of total amount over every line item
    pub naive_revenue: i64,
    /// Sum of total amount over one line per order
    pub deduplicated_revenue: i64,
}

impl FanOutReport {
    pub fn inflation(&self) -> i64 {
        self.naive_revenue - self.deduplicated_revenue
    }
}

/// Measure line-item fan-out over valid lines
///
/// Uses the first line of each order for the deduplicated figure, so the two
/// revenue numbers only match `dedupe` when every order is consistent.
pub fn analyze_fan_out(items: &[OrderLineItem]) -> FanOutReport {
    let groups = group_by_order(items);
    let naive_revenue = items.iter().map(|i| i.total_amount).sum();
    let deduplicated_revenue = groups.iter().map(|g| g[0].total_amount).sum();

    FanOutReport {
        line_items: items.len(),
        orders: groups.len(),
        factor: (!groups.is_empty()).then(|| items.len() as f64 / groups.len() as f64),
        naive_revenue,
        deduplicated_revenue,
    }
}
