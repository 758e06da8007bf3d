//! Cross-engine consistency check
//!
//! Runs the tabular and relational backends over the same dataset and
//! compares every metric exactly. Decimals compare by bit pattern.

use super::{AggregationBackend, RelationalBackend, TabularBackend, compute_with};
use crate::Result;
use crate::app::models::CleanDataset;
use crate::app::models::snapshot::{KpiSnapshot, Metric, MetricValue};
use crate::config::KpiConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

/// One metric on which two engines disagree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Divergence {
    pub metric: Metric,
    pub left: MetricValue,
    pub right: MetricValue,
}

/// Outcome of comparing two snapshots metric by metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub left_engine: String,
    pub right_engine: String,
    pub divergences: Vec<Divergence>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.divergences.is_empty()
    }
}

/// Compare every metric of two snapshots
pub fn compare_snapshots(left: &KpiSnapshot, right: &KpiSnapshot) -> ConsistencyReport {
    let divergences = Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let (l, r) = (left.get(metric), right.get(metric));
            (!l.bit_eq(r)).then(|| Divergence {
                metric,
                left: l.clone(),
                right: r.clone(),
            })
        })
        .collect();

    ConsistencyReport {
        left_engine: left.engine().to_string(),
        right_engine: right.engine().to_string(),
        divergences,
    }
}

/// Compute with both engines and fail on any divergence
///
/// Returns the tabular snapshot together with the (clean) report.
pub fn verify(
    dataset: &CleanDataset,
    config: &KpiConfig,
    run_id: Uuid,
    computed_at: DateTime<Utc>,
) -> Result<(KpiSnapshot, ConsistencyReport)> {
    let primary = compute_with(&TabularBackend, dataset, config, run_id, computed_at)?;
    let reference = compute_with(&RelationalBackend, dataset, config, run_id, computed_at)?;
    let report = compare_snapshots(&primary, &reference);

    if !report.is_consistent() {
        for divergence in &report.divergences {
            error!(
                "Engines disagree on {}: {}={:?}, {}={:?}",
                divergence.metric,
                TabularBackend.name(),
                divergence.left,
                RelationalBackend.name(),
                divergence.right
            );
        }
        return Err(crate::Error::consistency_violation(
            report.left_engine,
            report.right_engine,
            report.divergences.len(),
        ));
    }

    info!(
        "Engines agree on all {} metrics",
        Metric::ALL.len()
    );
    Ok((primary, report))
}
