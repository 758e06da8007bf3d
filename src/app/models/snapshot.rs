//! Immutable KPI snapshot and its metric catalogue
//!
//! A snapshot can only be obtained from [`SnapshotBuilder::finish`], which
//! refuses to build unless every metric in [`Metric::ALL`] has a value.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metric grouping used in nested output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    CustomerMetrics,
    OrderMetrics,
    RevenueMetrics,
    ProductMetrics,
    RegionalMetrics,
    TemporalMetrics,
    TopPerformers,
}

impl MetricCategory {
    pub fn name(self) -> &'static str {
        match self {
            MetricCategory::CustomerMetrics => "customer_metrics",
            MetricCategory::OrderMetrics => "order_metrics",
            MetricCategory::RevenueMetrics => "revenue_metrics",
            MetricCategory::ProductMetrics => "product_metrics",
            MetricCategory::RegionalMetrics => "regional_metrics",
            MetricCategory::TemporalMetrics => "temporal_metrics",
            MetricCategory::TopPerformers => "top_performers",
        }
    }
}

/// Every metric a snapshot carries
///
/// Monetary values are minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalCustomers,
    ActiveCustomers,
    RepeatCustomers,
    RepeatRate,
    AvgOrdersPerActiveCustomer,
    AvgRevenuePerActiveCustomer,
    VipCustomers,
    PremiumCustomers,
    RegularCustomers,
    CustomerSegments,

    TotalOrders,
    TotalLineItems,
    AvgLineItemsPerOrder,
    AvgOrderValue,
    MinOrderValue,
    MaxOrderValue,

    TotalRevenue,
    TotalItemsSold,
    AvgRevenuePerItem,

    UniqueSkus,
    TopProducts,

    RevenueByRegion,
    RegionsCount,

    MonthlyTrend,
    FirstOrderAt,
    LastOrderAt,
    WeekdayBreakdown,
    HourlyBreakdown,
    BusiestWeekday,
    BusiestHour,

    TopCustomers,
}

impl Metric {
    /// The full catalogue, in output order
    pub const ALL: [Metric; 31] = [
        Metric::TotalCustomers,
        Metric::ActiveCustomers,
        Metric::RepeatCustomers,
        Metric::RepeatRate,
        Metric::AvgOrdersPerActiveCustomer,
        Metric::AvgRevenuePerActiveCustomer,
        Metric::VipCustomers,
        Metric::PremiumCustomers,
        Metric::RegularCustomers,
        Metric::CustomerSegments,
        Metric::TotalOrders,
        Metric::TotalLineItems,
        Metric::AvgLineItemsPerOrder,
        Metric::AvgOrderValue,
        Metric::MinOrderValue,
        Metric::MaxOrderValue,
        Metric::TotalRevenue,
        Metric::TotalItemsSold,
        Metric::AvgRevenuePerItem,
        Metric::UniqueSkus,
        Metric::TopProducts,
        Metric::RevenueByRegion,
        Metric::RegionsCount,
        Metric::MonthlyTrend,
        Metric::FirstOrderAt,
        Metric::LastOrderAt,
        Metric::WeekdayBreakdown,
        Metric::HourlyBreakdown,
        Metric::BusiestWeekday,
        Metric::BusiestHour,
        Metric::TopCustomers,
    ];

    pub fn category(self) -> MetricCategory {
        use Metric::*;
        match self {
            TotalCustomers
            | ActiveCustomers
            | RepeatCustomers
            | RepeatRate
            | AvgOrdersPerActiveCustomer
            | AvgRevenuePerActiveCustomer
            | VipCustomers
            | PremiumCustomers
            | RegularCustomers
            | CustomerSegments => MetricCategory::CustomerMetrics,
            TotalOrders | TotalLineItems | AvgLineItemsPerOrder | AvgOrderValue
            | MinOrderValue | MaxOrderValue => MetricCategory::OrderMetrics,
            TotalRevenue | TotalItemsSold | AvgRevenuePerItem => MetricCategory::RevenueMetrics,
            UniqueSkus | TopProducts => MetricCategory::ProductMetrics,
            RevenueByRegion | RegionsCount => MetricCategory::RegionalMetrics,
            MonthlyTrend | FirstOrderAt | LastOrderAt | WeekdayBreakdown | HourlyBreakdown
            | BusiestWeekday | BusiestHour => MetricCategory::TemporalMetrics,
            TopCustomers => MetricCategory::TopPerformers,
        }
    }

    pub fn name(self) -> &'static str {
        use Metric::*;
        match self {
            TotalCustomers => "total_customers",
            ActiveCustomers => "active_customers",
            RepeatCustomers => "repeat_customers",
            RepeatRate => "repeat_rate",
            AvgOrdersPerActiveCustomer => "avg_orders_per_active_customer",
            AvgRevenuePerActiveCustomer => "avg_revenue_per_active_customer",
            VipCustomers => "vip_customers",
            PremiumCustomers => "premium_customers",
            RegularCustomers => "regular_customers",
            CustomerSegments => "customer_segments",
            TotalOrders => "total_orders",
            TotalLineItems => "total_line_items",
            AvgLineItemsPerOrder => "avg_line_items_per_order",
            AvgOrderValue => "avg_order_value",
            MinOrderValue => "min_order_value",
            MaxOrderValue => "max_order_value",
            TotalRevenue => "total_revenue",
            TotalItemsSold => "total_items_sold",
            AvgRevenuePerItem => "avg_revenue_per_item",
            UniqueSkus => "unique_skus",
            TopProducts => "top_products",
            RevenueByRegion => "revenue_by_region",
            RegionsCount => "regions_count",
            MonthlyTrend => "monthly_trend",
            FirstOrderAt => "first_order_at",
            LastOrderAt => "last_order_at",
            WeekdayBreakdown => "weekday_breakdown",
            HourlyBreakdown => "hourly_breakdown",
            BusiestWeekday => "busiest_weekday",
            BusiestHour => "busiest_hour",
            TopCustomers => "top_customers",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.category().name(), self.name())
    }
}

/// One row of a tabular metric
pub type MetricRow = BTreeMap<String, MetricValue>;

/// Value of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Undefined, e.g. a ratio with a zero denominator
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    Table(Vec<MetricRow>),
}

static NULL_VALUE: MetricValue = MetricValue::Null;

impl MetricValue {
    /// Exact equality; decimals compare by bit pattern
    pub fn bit_eq(&self, other: &MetricValue) -> bool {
        match (self, other) {
            (MetricValue::Null, MetricValue::Null) => true,
            (MetricValue::Integer(a), MetricValue::Integer(b)) => a == b,
            (MetricValue::Decimal(a), MetricValue::Decimal(b)) => a.to_bits() == b.to_bits(),
            (MetricValue::Text(a), MetricValue::Text(b)) => a == b,
            (MetricValue::Table(a), MetricValue::Table(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(left, right)| {
                        left.len() == right.len()
                            && left
                                .iter()
                                .zip(right)
                                .all(|((lk, lv), (rk, rv))| lk == rk && lv.bit_eq(rv))
                    })
            }
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Decimal(value) => Some(*value),
            MetricValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&[MetricRow]> {
        match self {
            MetricValue::Table(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Decimal(value)
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MetricValue::Null, Into::into)
    }
}

/// Immutable result of one KPI computation
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSnapshot {
    run_id: Uuid,
    computed_at: DateTime<Utc>,
    engine: String,
    values: BTreeMap<Metric, MetricValue>,
}

impl KpiSnapshot {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Name of the backend that produced the aggregates
    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn get(&self, metric: Metric) -> &MetricValue {
        self.values.get(&metric).unwrap_or(&NULL_VALUE)
    }

    pub fn values(&self) -> &BTreeMap<Metric, MetricValue> {
        &self.values
    }

    /// Whether two snapshots carry bit-identical metric values
    pub fn same_values(&self, other: &KpiSnapshot) -> bool {
        Metric::ALL
            .iter()
            .all(|metric| self.get(*metric).bit_eq(other.get(*metric)))
    }

    /// category name -> metric name -> value
    pub fn to_nested(&self) -> BTreeMap<String, BTreeMap<String, MetricValue>> {
        let mut nested: BTreeMap<String, BTreeMap<String, MetricValue>> = BTreeMap::new();
        for (metric, value) in &self.values {
            nested
                .entry(metric.category().name().to_string())
                .or_default()
                .insert(metric.name().to_string(), value.clone());
        }
        nested
    }
}

impl Serialize for KpiSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KpiSnapshot", 4)?;
        state.serialize_field("run_id", &self.run_id)?;
        state.serialize_field("computed_at", &self.computed_at)?;
        state.serialize_field("engine", &self.engine)?;
        state.serialize_field("metrics", &self.to_nested())?;
        state.end()
    }
}

/// Collects metric values and seals them into a [`KpiSnapshot`]
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    run_id: Uuid,
    computed_at: DateTime<Utc>,
    engine: String,
    values: BTreeMap<Metric, MetricValue>,
}

impl SnapshotBuilder {
    pub fn new(run_id: Uuid, computed_at: DateTime<Utc>, engine: impl Into<String>) -> Self {
        Self {
            run_id,
            computed_at,
            engine: engine.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, metric: Metric, value: impl Into<MetricValue>) -> &mut Self {
        self.values.insert(metric, value.into());
        self
    }

    /// Seal the snapshot; fails if any catalogued metric is unset
    pub fn finish(self) -> Result<KpiSnapshot> {
        let missing: Vec<String> = Metric::ALL
            .iter()
            .filter(|metric| !self.values.contains_key(metric))
            .map(|metric| metric.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(Error::incomplete_snapshot(missing));
        }

        Ok(KpiSnapshot {
            run_id: self.run_id,
            computed_at: self.computed_at,
            engine: self.engine,
            values: self.values,
        })
    }
}
