//! Record validation for normalized customers and order lines
//!
//! The validator partitions normalized records into valid entities and
//! rejected records, each rejection carrying exactly one [`ValidationIssue`].
//! It never mutates its input, and every call satisfies
//! `valid.len() + invalid.len() == input.len()`.
//!
//! Order-line rules apply in a fixed order and the first match wins:
//!
//! 1. `missing-field` - customer id, order id, SKU, quantity, amount or timestamp absent
//! 2. `invalid-quantity` - quantity not a positive integer
//! 3. `negative-amount` - total amount below zero
//! 4. `bad-timestamp` - timestamp present but unparseable
//!
//! Duplicate customer keys are not a validation concern; they are resolved by
//! the deduplicator once all customers are known to be individually valid.

pub mod customers;
pub mod order_lines;

#[cfg(test)]
pub mod tests;

pub use customers::validate_customers;
pub use order_lines::validate_order_lines;

use crate::app::models::quality_log::ValidationIssue;
use crate::app::models::{Customer, CustomerRecord, OrderLineItem, OrderLineRecord};

/// A rejected record and the reason for its rejection
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected<R> {
    pub record: R,
    pub issue: ValidationIssue,
}

/// Customer validation result
#[derive(Debug, Clone, Default)]
pub struct CustomerValidation {
    pub valid: Vec<Customer>,
    pub invalid: Vec<Rejected<CustomerRecord>>,
}

/// Order line validation result
#[derive(Debug, Clone, Default)]
pub struct OrderLineValidation {
    pub valid: Vec<OrderLineItem>,
    pub invalid: Vec<Rejected<OrderLineRecord>>,
}

impl CustomerValidation {
    pub fn reasons(&self) -> Vec<&ValidationIssue> {
        self.invalid.iter().map(|r| &r.issue).collect()
    }

    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

impl OrderLineValidation {
    pub fn reasons(&self) -> Vec<&ValidationIssue> {
        self.invalid.iter().map(|r| &r.issue).collect()
    }

    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}
