//! Header-to-field mapping for source files
//!
//! Source files name the same field differently (`mobile_number`, `contact`,
//! `phone`). Headers are normalized to lower snake case and matched against an
//! alias list per canonical field; the first alias present wins.

use csv::StringRecord;
use std::collections::HashMap;

/// Canonical field name and accepted header aliases
pub type FieldAliases = (&'static str, &'static [&'static str]);

pub const CUSTOMER_FIELDS: &[FieldAliases] = &[
    ("customer_id", &["customer_id", "customerid", "cust_id", "id"]),
    ("customer_name", &["customer_name", "name", "full_name"]),
    (
        "mobile_number",
        &["mobile_number", "mobile", "contact", "contact_number", "phone", "phone_number"],
    ),
    ("region", &["region", "area"]),
];

pub const ORDER_FIELDS: &[FieldAliases] = &[
    ("order_id", &["order_id", "orderid"]),
    ("customer_id", &["customer_id", "customerid", "cust_id"]),
    (
        "mobile_number",
        &["mobile_number", "mobile", "contact", "contact_number", "phone", "phone_number"],
    ),
    (
        "order_date_time",
        &["order_date_time", "order_datetime", "order_date", "ordered_at", "order_time"],
    ),
    ("total_amount", &["total_amount", "order_total", "amount"]),
    ("sku_id", &["sku_id", "sku"]),
    ("sku_count", &["sku_count", "quantity", "qty"]),
];

/// Column positions of canonical fields in one file
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    field_to_index: HashMap<&'static str, usize>,
}

impl ColumnMapping {
    /// Resolve canonical fields against a header row
    pub fn analyze(headers: &StringRecord, fields: &[FieldAliases]) -> Self {
        let name_to_index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, header)| (normalize_header(header), index))
            .collect();

        let field_to_index = fields
            .iter()
            .filter_map(|(field, aliases)| {
                aliases
                    .iter()
                    .find_map(|alias| name_to_index.get(*alias))
                    .map(|index| (*field, *index))
            })
            .collect();

        Self { field_to_index }
    }

    pub fn get_index(&self, field: &str) -> Option<usize> {
        self.field_to_index.get(field).copied()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_to_index.contains_key(field)
    }

    /// Canonical fields with no matching header
    pub fn missing_fields(&self, fields: &[FieldAliases]) -> Vec<&'static str> {
        fields
            .iter()
            .map(|(field, _)| *field)
            .filter(|field| !self.has_field(field))
            .collect()
    }

    /// Cell for a canonical field; `None` when the column or cell is absent
    pub fn value(&self, record: &StringRecord, field: &str) -> Option<String> {
        self.get_index(field)
            .and_then(|index| record.get(index))
            .map(str::to_string)
    }
}

/// Lowercase, trim, strip a byte-order mark, and join words with underscores
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
