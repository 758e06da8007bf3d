//! End-to-end KPI pipeline
//!
//! Raw rows flow through four stages:
//!
//! 1. **Schema check**: a required field missing from every row is fatal
//! 2. **Customers**: normalize, validate, collapse repeated ids and contacts
//! 3. **Order lines**: normalize (resolving customer ids via contact numbers),
//!    validate, then derive order headers
//! 4. **KPIs**: compute with the tabular engine, cross-checked against the
//!    relational engine when verification is enabled
//!
//! Every run yields a [`DataQualityLog`]. A snapshot exists only if all stages
//! succeed.
//!
//! [`DataQualityLog`]: crate::app::models::quality_log::DataQualityLog

pub mod freshness;
pub mod processor;

#[cfg(test)]
pub mod tests;

pub use freshness::{Freshness, assess_freshness};
pub use processor::{PipelineRunner, RunReport};
