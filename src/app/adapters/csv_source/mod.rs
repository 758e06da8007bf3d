//! CSV source adapter
//!
//! Reads the customer file and the order line-item file into raw rows. Cells
//! are trimmed but otherwise untouched; all cleaning happens in the record
//! normalizer. A column the file lacks yields `None` in every row.

pub mod column_mapping;
pub mod reader;

#[cfg(test)]
pub mod tests;

pub use column_mapping::ColumnMapping;
pub use reader::{SourceRows, read_customers, read_orders};
