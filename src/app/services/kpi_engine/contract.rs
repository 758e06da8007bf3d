//! The aggregation contract shared by every KPI backend
//!
//! Backends only produce [`Aggregates`]: integer counts and sums grouped the
//! same way. Everything derived from them (ratios, null rules, segmentation,
//! the Unknown region bucket, orderings and tie-breaks) lives here, so two
//! backends that agree on the aggregates produce bit-identical snapshots.

use crate::Result;
use crate::app::models::snapshot::{
    KpiSnapshot, Metric, MetricRow, MetricValue, SnapshotBuilder,
};
use crate::config::KpiConfig;
use crate::constants::{UNKNOWN_REGION, WEEKDAY_NAMES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Orders and revenue for one customer id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: String,
    /// Name from the customer table; `None` for ids only seen on orders
    pub name: Option<String>,
    pub region: Option<String>,
    pub order_count: i64,
    pub revenue: i64,
}

impl CustomerAggregate {
    /// Whether the id is in the customer table
    pub fn is_known(&self) -> bool {
        self.name.is_some()
    }
}

/// Units sold and orders containing one SKU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAggregate {
    pub sku_id: String,
    pub quantity: i64,
    pub order_count: i64,
}

/// Orders and revenue for one customer region; `None` is no region or no customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAggregate {
    pub region: Option<String>,
    pub order_count: i64,
    pub revenue: i64,
}

/// Orders and revenue for one calendar month in the configured offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAggregate {
    pub year: i32,
    pub month: u32,
    pub order_count: i64,
    pub revenue: i64,
}

/// Orders placed on one day of the week, `0` being Monday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayAggregate {
    pub weekday: u32,
    pub order_count: i64,
}

/// Orders placed in one hour of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourAggregate {
    pub hour: u32,
    pub order_count: i64,
}

/// Everything a backend must compute
///
/// Order-level figures come from order headers only; line-level figures come
/// from line items of orders that have a header. Timestamps are epoch
/// milliseconds; calendar buckets use the configured offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub customer_count: i64,
    pub order_count: i64,
    pub line_item_count: i64,
    pub items_sold: i64,
    pub total_revenue: i64,
    pub min_order_value: Option<i64>,
    pub max_order_value: Option<i64>,
    pub unique_skus: i64,
    pub first_order_at: Option<i64>,
    pub last_order_at: Option<i64>,
    /// Every id in the customer table or on an order header
    pub customers: Vec<CustomerAggregate>,
    pub products: Vec<ProductAggregate>,
    pub regions: Vec<RegionAggregate>,
    pub months: Vec<MonthAggregate>,
    pub weekdays: Vec<WeekdayAggregate>,
    pub hours: Vec<HourAggregate>,
}

impl Aggregates {
    /// Sort grouped rows into a backend-independent order
    pub fn canonicalize(mut self) -> Self {
        self.customers
            .sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        self.products.sort_by(|a, b| a.sku_id.cmp(&b.sku_id));
        self.regions.sort_by(|a, b| a.region.cmp(&b.region));
        self.months
            .sort_by(|a, b| (a.year, a.month).cmp(&(b.year, b.month)));
        self.weekdays.sort_by_key(|w| w.weekday);
        self.hours.sort_by_key(|h| h.hour);
        self
    }
}

/// Customer segment under the configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    Vip,
    Premium,
    Regular,
}

impl Segment {
    /// VIP on order count or lifetime revenue; Premium for one high-value order
    pub fn classify(order_count: i64, revenue: i64, config: &KpiConfig) -> Self {
        if order_count >= config.vip_min_orders || revenue > config.vip_revenue_threshold {
            Segment::Vip
        } else if order_count == 1 && revenue > config.premium_order_threshold {
            Segment::Premium
        } else {
            Segment::Regular
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Segment::Vip => "VIP",
            Segment::Premium => "Premium",
            Segment::Regular => "Regular",
        }
    }
}

/// `numerator / denominator`, `Null` when the denominator is zero
pub fn ratio(numerator: i64, denominator: i64) -> MetricValue {
    if denominator == 0 {
        MetricValue::Null
    } else {
        MetricValue::Decimal(numerator as f64 / denominator as f64)
    }
}

/// Derive the full snapshot from aggregates
pub fn build_snapshot(
    aggregates: Aggregates,
    config: &KpiConfig,
    run_id: Uuid,
    computed_at: DateTime<Utc>,
    engine: &str,
) -> Result<KpiSnapshot> {
    let agg = aggregates.canonicalize();
    let offset = config.offset()?;
    let mut builder = SnapshotBuilder::new(run_id, computed_at, engine);

    // customer metrics
    let active = agg.customers.iter().filter(|c| c.order_count > 0).count() as i64;
    // same population as the customer count the rate divides by
    let repeat = agg
        .customers
        .iter()
        .filter(|c| c.is_known() && c.order_count >= 2)
        .count() as i64;

    let mut segment_counts: BTreeMap<Segment, i64> = BTreeMap::new();
    let mut segment_rows = Vec::with_capacity(agg.customers.len());
    for customer in &agg.customers {
        let segment = Segment::classify(customer.order_count, customer.revenue, config);
        *segment_counts.entry(segment).or_insert(0) += 1;
        segment_rows.push(row([
            ("customer_id", customer.customer_id.as_str().into()),
            ("segment", segment.label().into()),
            ("order_count", customer.order_count.into()),
            ("revenue", customer.revenue.into()),
        ]));
    }
    let segment_count = |segment: Segment| segment_counts.get(&segment).copied().unwrap_or(0);

    builder
        .set(Metric::TotalCustomers, agg.customer_count)
        .set(Metric::ActiveCustomers, active)
        .set(Metric::RepeatCustomers, repeat)
        .set(Metric::RepeatRate, ratio(repeat, agg.customer_count))
        .set(
            Metric::AvgOrdersPerActiveCustomer,
            ratio(agg.order_count, active),
        )
        .set(
            Metric::AvgRevenuePerActiveCustomer,
            ratio(agg.total_revenue, active),
        )
        .set(Metric::VipCustomers, segment_count(Segment::Vip))
        .set(Metric::PremiumCustomers, segment_count(Segment::Premium))
        .set(Metric::RegularCustomers, segment_count(Segment::Regular))
        .set(Metric::CustomerSegments, MetricValue::Table(segment_rows));

    // order and revenue metrics
    builder
        .set(Metric::TotalOrders, agg.order_count)
        .set(Metric::TotalLineItems, agg.line_item_count)
        .set(
            Metric::AvgLineItemsPerOrder,
            ratio(agg.line_item_count, agg.order_count),
        )
        .set(Metric::AvgOrderValue, ratio(agg.total_revenue, agg.order_count))
        .set(Metric::MinOrderValue, agg.min_order_value)
        .set(Metric::MaxOrderValue, agg.max_order_value)
        .set(Metric::TotalRevenue, agg.total_revenue)
        .set(Metric::TotalItemsSold, agg.items_sold)
        .set(
            Metric::AvgRevenuePerItem,
            ratio(agg.total_revenue, agg.items_sold),
        );

    // product metrics
    let mut products = agg.products.clone();
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.sku_id.cmp(&b.sku_id)));
    let top_products = products
        .iter()
        .take(config.top_n)
        .map(|p| {
            row([
                ("sku_id", p.sku_id.as_str().into()),
                ("quantity", p.quantity.into()),
                ("order_count", p.order_count.into()),
            ])
        })
        .collect();

    builder
        .set(Metric::UniqueSkus, agg.unique_skus)
        .set(Metric::TopProducts, MetricValue::Table(top_products));

    // regional metrics
    let buckets = region_buckets(&agg.regions);
    builder
        .set(Metric::RegionsCount, buckets.len() as i64)
        .set(
            Metric::RevenueByRegion,
            MetricValue::Table(
                buckets
                    .into_iter()
                    .map(|(label, order_count, revenue)| {
                        row([
                            ("region", label.into()),
                            ("order_count", order_count.into()),
                            ("revenue", revenue.into()),
                        ])
                    })
                    .collect(),
            ),
        );

    // temporal metrics
    let trend = agg
        .months
        .iter()
        .map(|m| {
            row([
                ("month", format!("{:04}-{:02}", m.year, m.month).into()),
                ("order_count", m.order_count.into()),
                ("revenue", m.revenue.into()),
            ])
        })
        .collect();
    let local_time = |millis: Option<i64>| -> MetricValue {
        millis
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&offset).to_rfc3339())
            .into()
    };
    let weekday_name = |weekday: u32| {
        WEEKDAY_NAMES
            .get(weekday as usize)
            .copied()
            .unwrap_or("Unknown")
    };
    let weekday_rows = agg
        .weekdays
        .iter()
        .map(|w| {
            row([
                ("weekday", weekday_name(w.weekday).into()),
                ("order_count", w.order_count.into()),
            ])
        })
        .collect();
    let hour_rows = agg
        .hours
        .iter()
        .map(|h| {
            row([
                ("hour", i64::from(h.hour).into()),
                ("order_count", h.order_count.into()),
            ])
        })
        .collect();
    let busiest_weekday: MetricValue =
        busiest(agg.weekdays.iter().map(|w| (w.weekday, w.order_count)))
            .map(weekday_name)
            .into();
    let busiest_hour: MetricValue = busiest(agg.hours.iter().map(|h| (h.hour, h.order_count)))
        .map(i64::from)
        .into();

    builder
        .set(Metric::MonthlyTrend, MetricValue::Table(trend))
        .set(Metric::FirstOrderAt, local_time(agg.first_order_at))
        .set(Metric::LastOrderAt, local_time(agg.last_order_at))
        .set(Metric::WeekdayBreakdown, MetricValue::Table(weekday_rows))
        .set(Metric::HourlyBreakdown, MetricValue::Table(hour_rows))
        .set(Metric::BusiestWeekday, busiest_weekday)
        .set(Metric::BusiestHour, busiest_hour);

    // top performers
    let mut ranked: Vec<&CustomerAggregate> =
        agg.customers.iter().filter(|c| c.order_count > 0).collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    let top_customers = ranked
        .into_iter()
        .take(config.top_n)
        .map(|c| {
            row([
                ("customer_id", c.customer_id.as_str().into()),
                ("customer_name", c.name.as_deref().into()),
                ("region", c.region.as_deref().unwrap_or(UNKNOWN_REGION).into()),
                ("order_count", c.order_count.into()),
                ("revenue", c.revenue.into()),
            ])
        })
        .collect();

    builder.set(Metric::TopCustomers, MetricValue::Table(top_customers));

    builder.finish()
}

/// Merge region aggregates into labelled buckets, sorted by revenue then label
///
/// Orders with no region and orders whose customer is unknown share the
/// Unknown bucket, so bucket revenue always sums to total revenue. A region
/// spelled like the bucket label lands in the same bucket; the normalizer
/// already maps such regions to none.
pub fn region_buckets(regions: &[RegionAggregate]) -> Vec<(String, i64, i64)> {
    let mut merged: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for region in regions {
        let label = region
            .region
            .clone()
            .unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let entry = merged.entry(label).or_insert((0, 0));
        entry.0 += region.order_count;
        entry.1 += region.revenue;
    }

    let mut buckets: Vec<(String, i64, i64)> = merged
        .into_iter()
        .map(|(label, (orders, revenue))| (label, orders, revenue))
        .collect();
    buckets.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    buckets
}

/// Key with the highest count; ties go to the first key in iteration order
fn busiest<K: Copy>(counts: impl Iterator<Item = (K, i64)>) -> Option<K> {
    let mut best: Option<(K, i64)> = None;
    for (key, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

fn row<const N: usize>(fields: [(&str, MetricValue); N]) -> MetricRow {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
