//! Data quality log produced by every pipeline run
//!
//! Every record that does not reach the KPI engine is listed here with the
//! reason it was dropped. The log is produced even when the run fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Why a record was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationReason {
    MissingField,
    InvalidQuantity,
    NegativeAmount,
    BadTimestamp,
    DuplicateKey,
    /// Line items of one order disagree on order-level fields
    InconsistentOrderHeader,
}

impl ValidationReason {
    pub fn code(self) -> &'static str {
        match self {
            ValidationReason::MissingField => "missing-field",
            ValidationReason::InvalidQuantity => "invalid-quantity",
            ValidationReason::NegativeAmount => "negative-amount",
            ValidationReason::BadTimestamp => "bad-timestamp",
            ValidationReason::DuplicateKey => "duplicate-key",
            ValidationReason::InconsistentOrderHeader => "inconsistent-order-header",
        }
    }

    /// Severity the reason is logged at
    pub fn severity(self) -> IssueSeverity {
        match self {
            ValidationReason::InconsistentOrderHeader => IssueSeverity::Error,
            _ => IssueSeverity::Warning,
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Severity levels for quality issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// Record-level problem; the record is dropped and the run continues
    Warning,
    /// Order-integrity problem; the whole order is dropped
    Error,
}

/// Which source a rejected record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Customer,
    OrderLine,
    Order,
}

/// One excluded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: RecordKind,
    /// Natural identifier, or `row N` when the record has none
    pub record_id: String,
    /// 1-based source row, absent for order-level issues
    pub row_number: Option<usize>,
    pub reason: ValidationReason,
    pub detail: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    pub fn new(
        kind: RecordKind,
        record_id: impl Into<String>,
        row_number: Option<usize>,
        reason: ValidationReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            record_id: record_id.into(),
            row_number,
            reason,
            detail: detail.into(),
            severity: reason.severity(),
        }
    }
}

/// Input/valid/invalid counts for one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub input: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl StageCounts {
    pub fn new(input: usize, valid: usize, invalid: usize) -> Self {
        Self {
            input,
            valid,
            invalid,
        }
    }

    /// Whether every input record is accounted for
    pub fn is_balanced(&self) -> bool {
        self.valid + self.invalid == self.input
    }

    /// Valid records as a percentage of input
    pub fn valid_rate(&self) -> f64 {
        if self.input == 0 {
            100.0
        } else {
            (self.valid as f64 / self.input as f64) * 100.0
        }
    }
}

/// Order-level counts from deduplication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCounts {
    /// Distinct order ids among valid line items
    pub distinct_orders: usize,
    pub headers_emitted: usize,
    pub orders_excluded: usize,
    /// Valid line items dropped with their inconsistent order
    pub lines_excluded: usize,
}

/// A contact number claimed by two customer identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConflict {
    pub contact: String,
    /// Identifier that keeps the contact
    pub kept_customer_id: String,
    /// Identifier whose record was rejected
    pub rejected_customer_id: String,
}

/// How the run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed { error: String },
}

/// Quality log for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityLog {
    pub run_id: Uuid,
    pub run_at: DateTime<Utc>,
    pub customers: StageCounts,
    pub order_lines: StageCounts,
    pub orders: OrderCounts,
    pub contact_conflicts: Vec<ContactConflict>,
    pub issues: Vec<ValidationIssue>,
    pub outcome: RunOutcome,
}

impl DataQualityLog {
    /// Start an empty log for a run
    pub fn new(run_id: Uuid, run_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            run_at,
            customers: StageCounts::default(),
            order_lines: StageCounts::default(),
            orders: OrderCounts::default(),
            contact_conflicts: Vec::new(),
            issues: Vec::new(),
            outcome: RunOutcome::Completed,
        }
    }

    pub fn record_issues(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.outcome = RunOutcome::Failed {
            error: error.into(),
        };
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }

    /// `(identifier, reason)` for every excluded record
    pub fn rejections(&self) -> Vec<(String, ValidationReason)> {
        self.issues
            .iter()
            .map(|issue| (issue.record_id.clone(), issue.reason))
            .collect()
    }

    /// Issue counts per reason
    pub fn reason_counts(&self) -> BTreeMap<ValidationReason, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn issues_for(&self, kind: RecordKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        format!(
            "Customers: {}/{} valid | Order lines: {}/{} valid | Orders: {} headers, {} excluded | \
             Conflicts: {} | Issues: {}",
            self.customers.valid,
            self.customers.input,
            self.order_lines.valid,
            self.order_lines.input,
            self.orders.headers_emitted,
            self.orders.orders_excluded,
            self.contact_conflicts.len(),
            self.issues.len()
        )
    }
}
