//! Order line-item row normalization

use super::RecordNormalizer;
use super::field_parsers::{clean_text, parse_amount, parse_quantity, parse_timestamp};
use crate::app::models::{OrderLineRecord, RawOrderRow};
use tracing::debug;

impl RecordNormalizer {
    /// Normalize one order line row
    ///
    /// A blank customer id is filled from the contact directory when the row's
    /// contact number belongs to a known customer.
    pub fn normalize_order_line(&self, row_number: usize, raw: &RawOrderRow) -> OrderLineRecord {
        let contact = self.normalize_contact(raw.mobile_number.as_deref());
        let customer_id = clean_text(raw.customer_id.as_deref()).or_else(|| {
            contact
                .as_deref()
                .and_then(|c| self.directory.resolve(c))
                .map(str::to_string)
        });

        OrderLineRecord {
            row_number,
            order_id: clean_text(raw.order_id.as_deref()),
            customer_id,
            contact,
            sku_id: clean_text(raw.sku_id.as_deref()),
            quantity: parse_quantity(raw.sku_count.as_deref()),
            total_amount: parse_amount(raw.total_amount.as_deref()),
            ordered_at: parse_timestamp(raw.order_date_time.as_deref(), self.offset),
        }
    }

    /// Normalize order line rows, numbering them from 1
    pub fn normalize_order_lines(&self, rows: &[RawOrderRow]) -> Vec<OrderLineRecord> {
        let records: Vec<OrderLineRecord> = rows
            .iter()
            .enumerate()
            .map(|(index, raw)| self.normalize_order_line(index + 1, raw))
            .collect();

        let resolved = rows
            .iter()
            .zip(&records)
            .filter(|(raw, record)| {
                clean_text(raw.customer_id.as_deref()).is_none() && record.customer_id.is_some()
            })
            .count();

        debug!(
            "Normalized {} order line rows ({} customer ids resolved by contact)",
            records.len(),
            resolved
        );
        records
    }
}
