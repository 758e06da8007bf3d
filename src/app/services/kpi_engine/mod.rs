//! KPI computation over deduplicated orders
//!
//! One contract, two execution strategies. An [`AggregationBackend`] turns a
//! [`CleanDataset`] into integer [`Aggregates`]; [`contract::build_snapshot`]
//! derives every metric from those aggregates.
//!
//! # Backends
//!
//! - [`tabular::TabularBackend`] - polars group-bys over the deduplicated
//!   order headers (group, verify, pick first)
//! - [`relational::RelationalBackend`] - in-memory SQLite with an
//!   `order_headers` view that reduces line items with `MIN()` behind a
//!   `HAVING COUNT(DISTINCT ...) = 1` integrity filter
//!
//! [`oracle`] runs both and fails the run on any difference.

pub mod contract;
pub mod oracle;
pub mod relational;
pub mod tabular;

#[cfg(test)]
pub mod tests;

pub use contract::{Aggregates, Segment};
pub use oracle::{ConsistencyReport, Divergence};
pub use relational::RelationalBackend;
pub use tabular::TabularBackend;

use crate::Result;
use crate::app::models::snapshot::KpiSnapshot;
use crate::app::models::{CleanDataset, Customer, OrderHeader, OrderLineItem};
use crate::config::KpiConfig;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// A strategy for computing grouped aggregates
pub trait AggregationBackend {
    /// Engine name recorded on snapshots
    fn name(&self) -> &'static str;

    /// Compute aggregates; must ignore line items of orders without a header
    fn aggregate(&self, dataset: &CleanDataset, config: &KpiConfig) -> Result<Aggregates>;
}

/// Compute a snapshot with a given backend and run identity
pub fn compute_with(
    backend: &dyn AggregationBackend,
    dataset: &CleanDataset,
    config: &KpiConfig,
    run_id: Uuid,
    computed_at: DateTime<Utc>,
) -> Result<KpiSnapshot> {
    debug!(
        "Computing KPIs with {} engine: {} customers, {} orders, {} line items",
        backend.name(),
        dataset.customers.len(),
        dataset.headers.len(),
        dataset.items.len()
    );

    let aggregates = backend.aggregate(dataset, config)?;
    let snapshot =
        contract::build_snapshot(aggregates, config, run_id, computed_at, backend.name())?;

    info!(
        "{} engine computed {} metrics",
        backend.name(),
        snapshot.values().len()
    );
    Ok(snapshot)
}

/// Compute a snapshot from customers, order headers and line items
///
/// Uses the tabular engine. Empty input yields a complete snapshot with null
/// or zero values.
pub fn compute(
    customers: &[Customer],
    headers: &[OrderHeader],
    items: &[OrderLineItem],
    config: &KpiConfig,
) -> Result<KpiSnapshot> {
    let dataset = CleanDataset::new(customers.to_vec(), headers.to_vec(), items.to_vec());
    compute_with(
        &TabularBackend,
        &dataset,
        config,
        Uuid::new_v4(),
        Utc::now(),
    )
}
