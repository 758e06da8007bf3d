//! Data freshness relative to the run time

use crate::config::FreshnessConfig;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Age of the newest order at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No order survived cleaning
    NoData,
    Fresh { age: Duration },
    Stale { age: Duration },
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale { .. })
    }

    pub fn age(&self) -> Option<Duration> {
        match self {
            Freshness::NoData => None,
            Freshness::Fresh { age } | Freshness::Stale { age } => Some(*age),
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::NoData => write!(f, "no orders"),
            Freshness::Fresh { age } => write!(f, "fresh (newest order {}h old)", age.num_hours()),
            Freshness::Stale { age } => write!(f, "stale (newest order {}h old)", age.num_hours()),
        }
    }
}

/// Classify the newest order timestamp against the staleness threshold
///
/// Orders timestamped after `now` count as fresh.
pub fn assess_freshness(
    last_order_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &FreshnessConfig,
) -> Freshness {
    let Some(last) = last_order_at else {
        return Freshness::NoData;
    };

    let age = now - last;
    if age > Duration::hours(config.max_staleness_hours) {
        Freshness::Stale { age }
    } else {
        Freshness::Fresh { age }
    }
}
