//! CSV readers producing raw source rows

use super::column_mapping::{CUSTOMER_FIELDS, ColumnMapping, FieldAliases, ORDER_FIELDS};
use crate::app::models::{RawCustomerRow, RawOrderRow};
use crate::{Error, Result};
use csv::StringRecord;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows read from one file, plus records the CSV layer could not decode
#[derive(Debug, Clone, Default)]
pub struct SourceRows<R> {
    pub rows: Vec<R>,
    /// `"record N: error"` for each undecodable record
    pub skipped: Vec<String>,
}

/// Read the customer file
pub fn read_customers(path: &Path) -> Result<SourceRows<RawCustomerRow>> {
    read_rows(path, CUSTOMER_FIELDS, |record, mapping| RawCustomerRow {
        customer_id: mapping.value(record, "customer_id"),
        customer_name: mapping.value(record, "customer_name"),
        mobile_number: mapping.value(record, "mobile_number"),
        region: mapping.value(record, "region"),
    })
}

/// Read the order line-item file
pub fn read_orders(path: &Path) -> Result<SourceRows<RawOrderRow>> {
    read_rows(path, ORDER_FIELDS, |record, mapping| RawOrderRow {
        order_id: mapping.value(record, "order_id"),
        customer_id: mapping.value(record, "customer_id"),
        mobile_number: mapping.value(record, "mobile_number"),
        order_date_time: mapping.value(record, "order_date_time"),
        total_amount: mapping.value(record, "total_amount"),
        sku_id: mapping.value(record, "sku_id"),
        sku_count: mapping.value(record, "sku_count"),
    })
}

fn read_rows<R>(
    path: &Path,
    fields: &[FieldAliases],
    build: impl Fn(&StringRecord, &ColumnMapping) -> R,
) -> Result<SourceRows<R>> {
    let file_name = path.display().to_string();
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to open file", Some(e)))?;

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to read CSV headers", Some(e)))?
        .clone();

    let mapping = ColumnMapping::analyze(&headers, fields);
    let missing = mapping.missing_fields(fields);
    if !missing.is_empty() {
        debug!("{}: no column for {:?}", file_name, missing);
    }

    let mut result = SourceRows {
        rows: Vec::new(),
        skipped: Vec::new(),
    };
    for (index, record) in csv_reader.records().enumerate() {
        match record {
            Ok(record) => result.rows.push(build(&record, &mapping)),
            Err(e) => {
                warn!("{}: skipped record {}: {}", file_name, index + 1, e);
                result.skipped.push(format!("record {}: {}", index + 1, e));
            }
        }
    }

    info!(
        "Read {} rows from {} ({} skipped)",
        result.rows.len(),
        file_name,
        result.skipped.len()
    );
    Ok(result)
}
