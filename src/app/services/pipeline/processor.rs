//! Pipeline orchestration from raw rows to a verified KPI snapshot

use super::freshness::{Freshness, assess_freshness};
use crate::app::models::quality_log::{DataQualityLog, OrderCounts, StageCounts};
use crate::app::models::snapshot::KpiSnapshot;
use crate::app::models::{CleanDataset, RawCustomerRow, RawOrderRow};
use crate::app::services::deduplicator::{FanOutReport, analyze_fan_out, collapse_customers, dedupe};
use crate::app::services::kpi_engine::oracle::{self, ConsistencyReport};
use crate::app::services::kpi_engine::{TabularBackend, compute_with};
use crate::app::services::record_normalizer::{ContactDirectory, RecordNormalizer};
use crate::app::services::validator::{validate_customers, validate_order_lines};
use crate::config::PipelineConfig;
use crate::constants::{
    ORDER_CUSTOMER_KEY_FIELDS, PROGRESS_TEMPLATE, REQUIRED_CUSTOMER_FIELDS, REQUIRED_ORDER_FIELDS,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Everything one run produced
///
/// The quality log is always present; the snapshot only when every stage
/// succeeded.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub quality_log: DataQualityLog,
    pub result: Result<KpiSnapshot>,
    /// Present when both engines ran and agreed
    pub consistency: Option<ConsistencyReport>,
    pub fan_out: Option<FanOutReport>,
    pub freshness: Freshness,
}

impl RunReport {
    pub fn snapshot(&self) -> Option<&KpiSnapshot> {
        self.result.as_ref().ok()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Intermediate results carried out of a successful run
struct StageOutput {
    snapshot: KpiSnapshot,
    consistency: Option<ConsistencyReport>,
}

/// Runs normalization, validation, deduplication and KPI computation
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline with a fresh run id
    pub fn run(
        &self,
        raw_customers: &[RawCustomerRow],
        raw_orders: &[RawOrderRow],
        run_at: DateTime<Utc>,
    ) -> RunReport {
        self.run_with_id(Uuid::new_v4(), raw_customers, raw_orders, run_at)
    }

    /// Run the full pipeline under a given run id
    ///
    /// Never fails outright: fatal errors land in `RunReport::result` and mark
    /// the quality log as failed.
    pub fn run_with_id(
        &self,
        run_id: Uuid,
        raw_customers: &[RawCustomerRow],
        raw_orders: &[RawOrderRow],
        run_at: DateTime<Utc>,
    ) -> RunReport {
        info!(
            "Starting KPI run {}: {} customer rows, {} order rows",
            run_id,
            raw_customers.len(),
            raw_orders.len()
        );

        let mut report = RunReport {
            run_id,
            quality_log: DataQualityLog::new(run_id, run_at),
            result: Err(Error::data_validation("run did not complete")),
            consistency: None,
            fan_out: None,
            freshness: Freshness::NoData,
        };

        match self.execute(run_id, raw_customers, raw_orders, run_at, &mut report) {
            Ok(output) => {
                info!(
                    "KPI run {} complete: {}",
                    run_id,
                    report.quality_log.summary()
                );
                report.consistency = output.consistency;
                report.result = Ok(output.snapshot);
            }
            Err(e) => {
                error!("KPI run {} failed: {}", run_id, e);
                report.quality_log.mark_failed(e.to_string());
                report.result = Err(e);
            }
        }

        report
    }

    fn execute(
        &self,
        run_id: Uuid,
        raw_customers: &[RawCustomerRow],
        raw_orders: &[RawOrderRow],
        run_at: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<StageOutput> {
        check_required_columns("customers", raw_customers, REQUIRED_CUSTOMER_FIELDS, customer_has)?;
        check_required_columns("orders", raw_orders, REQUIRED_ORDER_FIELDS, order_has)?;
        check_any_column("orders", raw_orders, ORDER_CUSTOMER_KEY_FIELDS, order_has)?;

        let normalizer = RecordNormalizer::new(&self.config.kpi)?;
        let log = &mut report.quality_log;

        // Step 1: customers
        let pb = self.stage_progress(raw_customers.len(), "Cleaning customers");
        let customer_records = normalizer.normalize_customers(raw_customers);
        let customer_validation = validate_customers(&customer_records);
        let customers_invalid = customer_validation.invalid.len();
        log.record_issues(customer_validation.invalid.into_iter().map(|r| r.issue));

        let collapse = collapse_customers(customer_validation.valid);
        log.customers = StageCounts::new(
            raw_customers.len(),
            collapse.customers.len(),
            customers_invalid + collapse.rejected.len(),
        );
        log.record_issues(collapse.rejected);
        log.contact_conflicts = collapse.conflicts;
        finish_progress(pb, format!("{} customers kept", collapse.customers.len()));

        // Step 2: order lines, resolving customer ids through contact numbers
        let pb = self.stage_progress(raw_orders.len(), "Cleaning order lines");
        let normalizer =
            normalizer.with_directory(ContactDirectory::from_customers(&collapse.customers));
        let line_records = normalizer.normalize_order_lines(raw_orders);
        let line_validation = validate_order_lines(&line_records);
        log.order_lines = StageCounts::new(
            raw_orders.len(),
            line_validation.valid.len(),
            line_validation.invalid.len(),
        );
        log.record_issues(line_validation.invalid.into_iter().map(|r| r.issue));
        let valid_lines = line_validation.valid;
        finish_progress(pb, format!("{} order lines kept", valid_lines.len()));

        // Step 3: order headers
        let fan_out = analyze_fan_out(&valid_lines);
        if fan_out.inflation() > 0 {
            debug!(
                "Line-level revenue would overstate by {} ({} lines over {} orders)",
                fan_out.inflation(),
                fan_out.line_items,
                fan_out.orders
            );
        }
        report.fan_out = Some(fan_out);

        let dedup = dedupe(&valid_lines);
        log.orders = OrderCounts {
            distinct_orders: dedup.headers.len() + dedup.violations.len(),
            headers_emitted: dedup.headers.len(),
            orders_excluded: dedup.violations.len(),
            lines_excluded: dedup.excluded_line_count(),
        };
        log.record_issues(dedup.issues());
        if !dedup.violations.is_empty() {
            warn!(
                "{} orders excluded for inconsistent header fields",
                dedup.violations.len()
            );
        }

        let dataset = CleanDataset::new(collapse.customers, dedup.headers, valid_lines);
        report.freshness =
            assess_freshness(dataset.last_order_at(), run_at, &self.config.freshness);
        if report.freshness.is_stale() {
            warn!("Order data is {}", report.freshness);
        }

        // Step 4: KPIs
        let pb = self.stage_progress(dataset.headers.len(), "Computing KPIs");
        let output = if self.config.verify_consistency {
            let (snapshot, consistency) = oracle::verify(&dataset, &self.config.kpi, run_id, run_at)?;
            StageOutput {
                snapshot,
                consistency: Some(consistency),
            }
        } else {
            StageOutput {
                snapshot: compute_with(&TabularBackend, &dataset, &self.config.kpi, run_id, run_at)?,
                consistency: None,
            }
        };
        finish_progress(pb, format!("{} metrics computed", output.snapshot.values().len()));

        Ok(output)
    }

    fn stage_progress(&self, total: usize, stage: &str) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(stage.to_string());
        Some(pb)
    }
}

fn finish_progress(pb: Option<ProgressBar>, message: String) {
    if let Some(pb) = pb {
        if let Some(len) = pb.length() {
            pb.set_position(len);
        }
        pb.finish_with_message(message);
    }
}

fn customer_has(row: &RawCustomerRow, field: &str) -> bool {
    match field {
        "customer_id" => row.customer_id.is_some(),
        "mobile_number" => row.mobile_number.is_some(),
        _ => false,
    }
}

fn order_has(row: &RawOrderRow, field: &str) -> bool {
    match field {
        "order_id" => row.order_id.is_some(),
        "customer_id" => row.customer_id.is_some(),
        "mobile_number" => row.mobile_number.is_some(),
        "order_date_time" => row.order_date_time.is_some(),
        "total_amount" => row.total_amount.is_some(),
        "sku_id" => row.sku_id.is_some(),
        "sku_count" => row.sku_count.is_some(),
        _ => false,
    }
}

/// Fail when a required field is absent from every row of a non-empty source
fn check_required_columns<R>(
    source_name: &str,
    rows: &[R],
    fields: &[&str],
    has: fn(&R, &str) -> bool,
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    match fields
        .iter()
        .find(|field| !rows.iter().any(|row| has(row, field)))
    {
        Some(field) => {
            error!("Source {} has no value for required field {}", source_name, field);
            Err(Error::missing_column(source_name, *field))
        }
        None => Ok(()),
    }
}

/// Fail when none of `fields` has a value in any row of a non-empty source
fn check_any_column<R>(
    source_name: &str,
    rows: &[R],
    fields: &[&str],
    has: fn(&R, &str) -> bool,
) -> Result<()> {
    if rows.is_empty()
        || fields
            .iter()
            .any(|field| rows.iter().any(|row| has(row, field)))
    {
        return Ok(());
    }

    let field = fields.join(" or ");
    error!("Source {} has no value for any of {}", source_name, field);
    Err(Error::missing_column(source_name, field))
}
