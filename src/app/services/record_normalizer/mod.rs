//! Record normalization for raw customer and order rows
//!
//! The normalizer converts each raw row into a typed record without deciding
//! whether the record is acceptable. It trims and canonicalizes text, parses
//! timestamps and numbers, and forwards anything it cannot parse as
//! `FieldValue::Malformed` for the validator to reject.
//!
//! # Components
//!
//! - [`field_parsers`] - Pure parsers for timestamps, quantities, amounts and text
//! - [`customer`] - Customer row normalization and the contact directory
//! - [`order`] - Order line-item row normalization
//!
//! Order rows that lack a customer identifier but carry a contact number are
//! resolved through a [`ContactDirectory`] built from validated customers.

pub mod customer;
pub mod field_parsers;
pub mod order;

#[cfg(test)]
pub mod tests;

pub use customer::ContactDirectory;

use crate::Result;
use crate::config::KpiConfig;
use chrono::FixedOffset;
use regex::Regex;

/// Normalizes raw rows into typed records
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    /// Offset for naive timestamps
    offset: FixedOffset,
    /// Characters stripped from contact numbers
    contact_separators: Regex,
    /// Contact number to customer id, for order rows without a customer id
    directory: ContactDirectory,
}

impl RecordNormalizer {
    /// Create a normalizer for the configured offset with an empty directory
    pub fn new(config: &KpiConfig) -> Result<Self> {
        Ok(Self {
            offset: config.offset()?,
            contact_separators: Regex::new(r"[\s\-().]")?,
            directory: ContactDirectory::default(),
        })
    }

    /// Attach a contact directory for customer id resolution
    pub fn with_directory(mut self, directory: ContactDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    /// Strip separators from a contact number; blank becomes `None`
    pub fn normalize_contact(&self, raw: Option<&str>) -> Option<String> {
        field_parsers::clean_text(raw)
            .map(|contact| self.contact_separators.replace_all(&contact, "").into_owned())
            .filter(|contact| !contact.is_empty())
    }
}
