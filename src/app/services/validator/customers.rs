//! Customer validation rules

use super::{CustomerValidation, Rejected};
use crate::app::models::quality_log::{RecordKind, ValidationIssue, ValidationReason};
use crate::app::models::{Customer, CustomerRecord};
use tracing::{info, warn};

/// Partition normalized customers into valid and rejected
///
/// A customer needs an identifier and a contact number; name and region are
/// optional.
pub fn validate_customers(records: &[CustomerRecord]) -> CustomerValidation {
    let mut result = CustomerValidation::default();

    for record in records {
        match check_customer(record) {
            Ok(customer) => result.valid.push(customer),
            Err(issue) => {
                warn!(
                    "Rejected customer {} (row {}): {}",
                    issue.record_id, record.row_number, issue.detail
                );
                result.invalid.push(Rejected {
                    record: record.clone(),
                    issue,
                });
            }
        }
    }

    info!(
        "Customer validation complete: {} valid, {} rejected of {}",
        result.valid.len(),
        result.invalid.len(),
        records.len()
    );

    result
}

fn check_customer(record: &CustomerRecord) -> Result<Customer, ValidationIssue> {
    let mut missing = Vec::new();
    if record.customer_id.is_none() {
        missing.push("customer_id");
    }
    if record.contact.is_none() {
        missing.push("mobile_number");
    }

    match (&record.customer_id, &record.contact) {
        (Some(customer_id), Some(contact)) => Ok(Customer {
            customer_id: customer_id.clone(),
            name: record.name.clone(),
            contact: contact.clone(),
            region: record.region.clone(),
        }),
        _ => Err(ValidationIssue::new(
            RecordKind::Customer,
            record.record_id(),
            Some(record.row_number),
            ValidationReason::MissingField,
            format!("missing {}", missing.join(", ")),
        )),
    }
}
