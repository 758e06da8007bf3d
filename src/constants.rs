//! Application constants for the KPI pipeline
//!
//! Default thresholds, required field names, history file names and the
//! timestamp formats accepted from upstream sources.

// =============================================================================
// Segmentation and ranking defaults
// =============================================================================

/// Minimum number of orders that makes a customer VIP
pub const DEFAULT_VIP_MIN_ORDERS: i64 = 3;

/// Lifetime revenue (minor units) above which a customer is VIP
pub const DEFAULT_VIP_REVENUE_THRESHOLD: i64 = 1_000_000;

/// Single order value (minor units) above which a one-order customer is Premium
pub const DEFAULT_PREMIUM_ORDER_THRESHOLD: i64 = 500_000;

/// Default size of top-N rankings
pub const DEFAULT_TOP_N: usize = 5;

/// Default data freshness threshold in hours
pub const DEFAULT_MAX_STALENESS_HOURS: i64 = 24;

/// Label used for orders whose customer has no region or is unknown
pub const UNKNOWN_REGION: &str = "Unknown";

/// Display name used when a customer record has no name
pub const UNKNOWN_CUSTOMER_NAME: &str = "Unknown";

/// Minor units per major currency unit
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

// =============================================================================
// Source schemas
// =============================================================================

/// Fields a customer source must carry in at least one record
pub const REQUIRED_CUSTOMER_FIELDS: &[&str] = &["customer_id", "mobile_number"];

/// Fields an order source must carry in at least one record
pub const REQUIRED_ORDER_FIELDS: &[&str] = &[
    "order_id",
    "order_date_time",
    "total_amount",
    "sku_id",
    "sku_count",
];

/// Fields identifying an order's customer; at least one must be present
pub const ORDER_CUSTOMER_KEY_FIELDS: &[&str] = &["customer_id", "mobile_number"];

/// Weekday labels indexed from Monday
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Timestamp formats that carry an explicit offset
pub const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%:z"];

/// Naive timestamp formats, interpreted in the configured UTC offset
pub const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

// =============================================================================
// Run history
// =============================================================================

/// Append-only file receiving one snapshot per run
pub const SNAPSHOT_HISTORY_FILE: &str = "kpi_snapshots.jsonl";

/// Append-only file receiving one quality log per run
pub const QUALITY_HISTORY_FILE: &str = "data_quality.jsonl";

/// Default output directory for run history
pub const DEFAULT_OUTPUT_DIR: &str = "./kpi_output";

// =============================================================================
// Progress display
// =============================================================================

/// Progress bar template shared by pipeline stages
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
