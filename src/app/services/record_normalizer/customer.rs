//! Customer row normalization

use super::RecordNormalizer;
use super::field_parsers::{clean_text, title_case};
use crate::app::models::{Customer, CustomerRecord, RawCustomerRow};
use crate::constants::{UNKNOWN_CUSTOMER_NAME, UNKNOWN_REGION};
use std::collections::HashMap;
use tracing::debug;

/// Lookup from normalized contact number to customer identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDirectory {
    by_contact: HashMap<String, String>,
}

impl ContactDirectory {
    /// Build from validated customers, whose contacts are already unique
    pub fn from_customers(customers: &[Customer]) -> Self {
        let by_contact = customers
            .iter()
            .map(|c| (c.contact.clone(), c.customer_id.clone()))
            .collect();
        Self { by_contact }
    }

    pub fn resolve(&self, contact: &str) -> Option<&str> {
        self.by_contact.get(contact).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_contact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_contact.is_empty()
    }
}

impl RecordNormalizer {
    /// Normalize one customer row
    pub fn normalize_customer(&self, row_number: usize, raw: &RawCustomerRow) -> CustomerRecord {
        CustomerRecord {
            row_number,
            customer_id: clean_text(raw.customer_id.as_deref()),
            name: clean_text(raw.customer_name.as_deref())
                .unwrap_or_else(|| UNKNOWN_CUSTOMER_NAME.to_string()),
            contact: self.normalize_contact(raw.mobile_number.as_deref()),
            // "unknown" in the source is no region, not a region named Unknown
            region: clean_text(raw.region.as_deref())
                .map(|r| title_case(&r))
                .filter(|r| r != UNKNOWN_REGION),
        }
    }

    /// Normalize customer rows, numbering them from 1
    pub fn normalize_customers(&self, rows: &[RawCustomerRow]) -> Vec<CustomerRecord> {
        let records: Vec<CustomerRecord> = rows
            .iter()
            .enumerate()
            .map(|(index, raw)| self.normalize_customer(index + 1, raw))
            .collect();

        debug!("Normalized {} customer rows", records.len());
        records
    }
}
