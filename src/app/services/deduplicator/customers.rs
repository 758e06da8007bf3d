//! Customer collapse: one record per identifier, one identifier per contact

use crate::app::models::Customer;
use crate::app::models::quality_log::{
    ContactConflict, RecordKind, ValidationIssue, ValidationReason,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Result of collapsing valid customers
#[derive(Debug, Clone, Default)]
pub struct CustomerCollapse {
    /// Unique customers, in first-seen order of their identifier
    pub customers: Vec<Customer>,
    /// Rejections for superseded and conflicting records
    pub rejected: Vec<ValidationIssue>,
    pub conflicts: Vec<ContactConflict>,
}

/// Collapse valid customers into a unique set
///
/// A repeated identifier replaces the earlier record's non-key fields (last
/// write wins) and the earlier record is rejected as `duplicate-key`. A
/// contact number that already belongs to another identifier keeps its first
/// owner; the later record is rejected and the conflict is kept for review.
pub fn collapse_customers(valid: Vec<Customer>) -> CustomerCollapse {
    let input_count = valid.len();
    let mut result = CustomerCollapse::default();
    let mut position_by_id: HashMap<String, usize> = HashMap::new();
    let mut owner_by_contact: HashMap<String, String> = HashMap::new();

    for customer in valid {
        if let Some(owner) = owner_by_contact.get(&customer.contact) {
            if owner != &customer.customer_id {
                warn!(
                    "Contact {} claimed by {} but already belongs to {}; keeping {}",
                    customer.contact, customer.customer_id, owner, owner
                );
                result.rejected.push(ValidationIssue::new(
                    RecordKind::Customer,
                    customer.customer_id.clone(),
                    None,
                    ValidationReason::DuplicateKey,
                    format!("contact {} already belongs to {}", customer.contact, owner),
                ));
                result.conflicts.push(ContactConflict {
                    contact: customer.contact.clone(),
                    kept_customer_id: owner.clone(),
                    rejected_customer_id: customer.customer_id,
                });
                continue;
            }
        }

        match position_by_id.get(&customer.customer_id) {
            Some(&position) => {
                let previous = std::mem::replace(&mut result.customers[position], customer);
                let current = &result.customers[position];
                if previous.contact != current.contact {
                    owner_by_contact.remove(&previous.contact);
                    owner_by_contact.insert(current.contact.clone(), current.customer_id.clone());
                }
                result.rejected.push(ValidationIssue::new(
                    RecordKind::Customer,
                    previous.customer_id.clone(),
                    None,
                    ValidationReason::DuplicateKey,
                    "superseded by a later record with the same customer_id",
                ));
            }
            None => {
                position_by_id.insert(customer.customer_id.clone(), result.customers.len());
                owner_by_contact.insert(customer.contact.clone(), customer.customer_id.clone());
                result.customers.push(customer);
            }
        }
    }

    info!(
        "Customer collapse complete: {} -> {} customers ({} contact conflicts)",
        input_count,
        result.customers.len(),
        result.conflicts.len()
    );

    result
}
