//! Run-scoped configuration for the KPI pipeline.
//!
//! A `PipelineConfig` is built once per run (defaults, then an optional TOML
//! file, then CLI overrides) and passed by reference into every stage.

use crate::constants::{
    DEFAULT_MAX_STALENESS_HOURS, DEFAULT_PREMIUM_ORDER_THRESHOLD, DEFAULT_TOP_N,
    DEFAULT_VIP_MIN_ORDERS, DEFAULT_VIP_REVENUE_THRESHOLD,
};
use crate::{Error, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Thresholds and presentation settings consumed by the KPI engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    /// Order count at or above which a customer is VIP
    pub vip_min_orders: i64,

    /// Lifetime revenue (minor units) above which a customer is VIP
    pub vip_revenue_threshold: i64,

    /// Order value (minor units) above which a single-order customer is Premium
    pub premium_order_threshold: i64,

    /// Number of entries in top-N rankings
    pub top_n: usize,

    /// Offset used for naive timestamps and calendar-month bucketing
    pub utc_offset_minutes: i32,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            vip_min_orders: DEFAULT_VIP_MIN_ORDERS,
            vip_revenue_threshold: DEFAULT_VIP_REVENUE_THRESHOLD,
            premium_order_threshold: DEFAULT_PREMIUM_ORDER_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            utc_offset_minutes: 0,
        }
    }
}

impl KpiConfig {
    /// The configured offset as a chrono timezone
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            Error::configuration(format!(
                "UTC offset of {} minutes is out of range",
                self.utc_offset_minutes
            ))
        })
    }

    /// Offset in seconds
    pub fn offset_seconds(&self) -> i64 {
        i64::from(self.utc_offset_minutes) * 60
    }

    /// Offset in milliseconds, for engines bucketing epoch-millisecond times
    pub fn offset_millis(&self) -> i64 {
        self.offset_seconds() * 1000
    }
}

/// Data freshness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Age of the newest order after which data counts as stale
    pub max_staleness_hours: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            max_staleness_hours: DEFAULT_MAX_STALENESS_HOURS,
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// KPI thresholds and bucketing
    pub kpi: KpiConfig,

    /// Freshness check
    pub freshness: FreshnessConfig,

    /// Run the relational engine as well and fail on any divergence
    pub verify_consistency: bool,

    /// Show progress bars for pipeline stages
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kpi: KpiConfig::default(),
            freshness: FreshnessConfig::default(),
            verify_consistency: true,
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Self = toml::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Set the UTC offset in minutes
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.kpi.utc_offset_minutes = minutes;
        self
    }

    /// Set the top-N ranking size
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.kpi.top_n = top_n;
        self
    }

    /// Set VIP thresholds
    pub fn with_vip_thresholds(mut self, min_orders: i64, revenue_threshold: i64) -> Self {
        self.kpi.vip_min_orders = min_orders;
        self.kpi.vip_revenue_threshold = revenue_threshold;
        self
    }

    /// Set the Premium single-order threshold
    pub fn with_premium_threshold(mut self, threshold: i64) -> Self {
        self.kpi.premium_order_threshold = threshold;
        self
    }

    /// Set the freshness threshold
    pub fn with_max_staleness_hours(mut self, hours: i64) -> Self {
        self.freshness.max_staleness_hours = hours;
        self
    }

    /// Skip relational cross-verification
    pub fn without_verification(mut self) -> Self {
        self.verify_consistency = false;
        self
    }

    /// Enable progress bars
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.kpi.vip_min_orders < 1 {
            return Err(Error::configuration("vip_min_orders must be at least 1"));
        }
        if self.kpi.vip_revenue_threshold < 0 || self.kpi.premium_order_threshold < 0 {
            return Err(Error::configuration(
                "Segmentation thresholds must not be negative",
            ));
        }
        if self.kpi.top_n == 0 {
            return Err(Error::configuration("top_n must be greater than 0"));
        }
        if self.freshness.max_staleness_hours <= 0 {
            return Err(Error::configuration(
                "max_staleness_hours must be greater than 0",
            ));
        }
        self.kpi.offset()?;
        Ok(())
    }
}

/// Parse an offset such as `+05:30`, `-0800`, `Z` or `UTC` into minutes
pub fn parse_utc_offset(value: &str) -> Result<i32> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(0);
    }

    let invalid = || Error::configuration(format!("Invalid UTC offset '{}'", value));

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(sign * (hours * 60 + minutes))
}
