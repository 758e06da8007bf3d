//! Order line validation rules

use super::{OrderLineValidation, Rejected};
use crate::app::models::quality_log::{RecordKind, ValidationIssue, ValidationReason};
use crate::app::models::{FieldValue, OrderLineItem, OrderLineRecord};
use tracing::{info, warn};

/// Partition normalized order lines into valid items and rejected records
pub fn validate_order_lines(records: &[OrderLineRecord]) -> OrderLineValidation {
    let mut result = OrderLineValidation::default();

    for record in records {
        match check_order_line(record) {
            Ok(item) => result.valid.push(item),
            Err((reason, detail)) => {
                let issue = ValidationIssue::new(
                    RecordKind::OrderLine,
                    record.record_id(),
                    Some(record.row_number),
                    reason,
                    detail,
                );
                warn!(
                    "Rejected order line {} (row {}): {} ({})",
                    issue.record_id, record.row_number, reason, issue.detail
                );
                result.invalid.push(Rejected {
                    record: record.clone(),
                    issue,
                });
            }
        }
    }

    info!(
        "Order line validation complete: {} valid, {} rejected of {}",
        result.valid.len(),
        result.invalid.len(),
        records.len()
    );

    result
}

/// Apply the rules in precedence order; the first failure wins
fn check_order_line(
    record: &OrderLineRecord,
) -> std::result::Result<OrderLineItem, (ValidationReason, String)> {
    let missing = missing_fields(record);
    if !missing.is_empty() {
        return Err((
            ValidationReason::MissingField,
            format!("missing {}", missing.join(", ")),
        ));
    }

    let quantity = match &record.quantity {
        FieldValue::Present(q) if *q > 0 => *q,
        FieldValue::Present(q) => {
            return Err((
                ValidationReason::InvalidQuantity,
                format!("quantity {} is not positive", q),
            ));
        }
        FieldValue::Malformed(raw) => {
            return Err((
                ValidationReason::InvalidQuantity,
                format!("quantity '{}' is not an integer", raw),
            ));
        }
        FieldValue::Missing => unreachable_missing("sku_count")?,
    };

    let total_amount = match record.total_amount.value() {
        Some(amount) if amount < 0 => {
            return Err((
                ValidationReason::NegativeAmount,
                format!("total_amount {} is negative", amount),
            ));
        }
        Some(amount) => amount,
        None => unreachable_missing("total_amount")?,
    };

    let ordered_at = match &record.ordered_at {
        FieldValue::Present(at) => *at,
        FieldValue::Malformed(raw) => {
            return Err((
                ValidationReason::BadTimestamp,
                format!("cannot parse order_date_time '{}'", raw),
            ));
        }
        FieldValue::Missing => unreachable_missing("order_date_time")?,
    };

    match (&record.order_id, &record.sku_id, &record.customer_id) {
        (Some(order_id), Some(sku_id), Some(customer_id)) => Ok(OrderLineItem {
            row_number: record.row_number,
            order_id: order_id.clone(),
            sku_id: sku_id.clone(),
            quantity,
            customer_id: customer_id.clone(),
            contact: record.contact.clone(),
            ordered_at,
            total_amount,
        }),
        _ => unreachable_missing("identifier"),
    }
}

/// Required fields with no usable value
///
/// A malformed amount has no usable value and counts as missing.
fn missing_fields(record: &OrderLineRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if record.customer_id.is_none() {
        missing.push("customer_id");
    }
    if record.order_id.is_none() {
        missing.push("order_id");
    }
    if record.sku_id.is_none() {
        missing.push("sku_id");
    }
    if record.quantity.is_missing() {
        missing.push("sku_count");
    }
    if !record.total_amount.is_present() {
        missing.push("total_amount");
    }
    if record.ordered_at.is_missing() {
        missing.push("order_date_time");
    }
    missing
}

/// Fallback for a field `missing_fields` already rejects
fn unreachable_missing<T>(field: &str) -> std::result::Result<T, (ValidationReason, String)> {
    Err((ValidationReason::MissingField, format!("missing {}", field)))
}
