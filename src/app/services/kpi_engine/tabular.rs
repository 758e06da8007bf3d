//! Tabular KPI backend built on polars
//!
//! Works from the deduplicator's order headers: each order was grouped,
//! verified and reduced to its first line before reaching this engine. Line
//! items are inner-joined against the header ids so lines of excluded orders
//! never count.

use super::AggregationBackend;
use super::contract::{
    Aggregates, CustomerAggregate, HourAggregate, MonthAggregate, ProductAggregate,
    RegionAggregate, WeekdayAggregate,
};
use crate::Result;
use crate::app::models::CleanDataset;
use crate::config::KpiConfig;
use polars::prelude::*;
use tracing::debug;

/// Polars lazy-frame aggregation
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularBackend;

impl AggregationBackend for TabularBackend {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn aggregate(&self, dataset: &CleanDataset, config: &KpiConfig) -> Result<Aggregates> {
        let frames = build_frames(dataset)?;
        let headers = frames.headers.clone().lazy();
        let kept_items = frames.items.clone().lazy().join(
            headers.clone().select([col("order_id")]),
            [col("order_id")],
            [col("order_id")],
            JoinArgs::new(JoinType::Inner),
        );

        let order_scalars = headers
            .clone()
            .select([
                len().cast(DataType::Int64).alias("order_count"),
                col("total_amount").sum().alias("total_revenue"),
                col("total_amount").min().alias("min_order_value"),
                col("total_amount").max().alias("max_order_value"),
                col("ordered_at").min().alias("first_order_at"),
                col("ordered_at").max().alias("last_order_at"),
            ])
            .collect()?;

        let line_scalars = kept_items
            .clone()
            .select([
                len().cast(DataType::Int64).alias("line_item_count"),
                col("quantity").sum().alias("items_sold"),
                col("sku_id")
                    .n_unique()
                    .cast(DataType::Int64)
                    .alias("unique_skus"),
            ])
            .collect()?;

        let aggregates = Aggregates {
            customer_count: frames.customers.height() as i64,
            order_count: scalar(&order_scalars, "order_count")?.unwrap_or(0),
            line_item_count: scalar(&line_scalars, "line_item_count")?.unwrap_or(0),
            items_sold: scalar(&line_scalars, "items_sold")?.unwrap_or(0),
            total_revenue: scalar(&order_scalars, "total_revenue")?.unwrap_or(0),
            min_order_value: scalar(&order_scalars, "min_order_value")?,
            max_order_value: scalar(&order_scalars, "max_order_value")?,
            unique_skus: scalar(&line_scalars, "unique_skus")?.unwrap_or(0),
            first_order_at: scalar(&order_scalars, "first_order_at")?,
            last_order_at: scalar(&order_scalars, "last_order_at")?,
            customers: customer_aggregates(&frames)?,
            products: product_aggregates(kept_items)?,
            regions: region_aggregates(&frames)?,
            months: month_aggregates(headers.clone(), config.offset_millis())?,
            weekdays: weekday_aggregates(headers.clone(), config.offset_millis())?,
            hours: hour_aggregates(headers, config.offset_millis())?,
        };

        debug!(
            "Tabular aggregates: {} orders, {} customers, {} products, {} regions, {} months",
            aggregates.order_count,
            aggregates.customers.len(),
            aggregates.products.len(),
            aggregates.regions.len(),
            aggregates.months.len()
        );

        Ok(aggregates)
    }
}

struct Frames {
    customers: DataFrame,
    headers: DataFrame,
    items: DataFrame,
}

fn build_frames(dataset: &CleanDataset) -> Result<Frames> {
    let customers = DataFrame::new(vec![
        Column::new(
            "customer_id".into(),
            dataset
                .customers
                .iter()
                .map(|c| c.customer_id.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "customer_name".into(),
            dataset
                .customers
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "region".into(),
            dataset
                .customers
                .iter()
                .map(|c| c.region.as_deref())
                .collect::<Vec<_>>(),
        ),
    ])?;

    let headers = DataFrame::new(vec![
        Column::new(
            "order_id".into(),
            dataset
                .headers
                .iter()
                .map(|h| h.order_id.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "customer_id".into(),
            dataset
                .headers
                .iter()
                .map(|h| h.customer_id.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "ordered_at".into(),
            dataset
                .headers
                .iter()
                .map(|h| h.ordered_at.timestamp_millis())
                .collect::<Vec<i64>>(),
        ),
        Column::new(
            "total_amount".into(),
            dataset
                .headers
                .iter()
                .map(|h| h.total_amount)
                .collect::<Vec<i64>>(),
        ),
    ])?;

    let items = DataFrame::new(vec![
        Column::new(
            "order_id".into(),
            dataset
                .items
                .iter()
                .map(|i| i.order_id.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "sku_id".into(),
            dataset
                .items
                .iter()
                .map(|i| i.sku_id.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "quantity".into(),
            dataset
                .items
                .iter()
                .map(|i| i.quantity)
                .collect::<Vec<i64>>(),
        ),
    ])?;

    Ok(Frames {
        customers,
        headers,
        items,
    })
}

/// Per-customer orders and revenue for every id in the customer table or on a header
fn customer_aggregates(frames: &Frames) -> Result<Vec<CustomerAggregate>> {
    let per_customer = frames
        .headers
        .clone()
        .lazy()
        .group_by([col("customer_id")])
        .agg([
            len().cast(DataType::Int64).alias("order_count"),
            col("total_amount").sum().alias("revenue"),
        ]);

    let known_ids = frames
        .customers
        .select(["customer_id"])?
        .vstack(&frames.headers.select(["customer_id"])?)?;

    let df = known_ids
        .lazy()
        .group_by([col("customer_id")])
        .agg([len().alias("rows")])
        .join(
            frames.customers.clone().lazy(),
            [col("customer_id")],
            [col("customer_id")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            per_customer,
            [col("customer_id")],
            [col("customer_id")],
            JoinArgs::new(JoinType::Left),
        )
        .select([
            col("customer_id"),
            col("customer_name"),
            col("region"),
            col("order_count").fill_null(lit(0i64)),
            col("revenue").fill_null(lit(0i64)),
        ])
        .collect()?;

    let ids = string_column(&df, "customer_id")?;
    let names = string_column(&df, "customer_name")?;
    let regions = string_column(&df, "region")?;
    let order_counts = i64_column(&df, "order_count")?;
    let revenues = i64_column(&df, "revenue")?;

    Ok(ids
        .into_iter()
        .zip(names)
        .zip(regions)
        .zip(order_counts.into_iter().zip(revenues))
        .map(
            |(((customer_id, name), region), (order_count, revenue))| CustomerAggregate {
                customer_id: customer_id.unwrap_or_default(),
                name,
                region,
                order_count,
                revenue,
            },
        )
        .collect())
}

fn product_aggregates(kept_items: LazyFrame) -> Result<Vec<ProductAggregate>> {
    let df = kept_items
        .group_by([col("sku_id")])
        .agg([
            col("quantity").sum().alias("quantity"),
            col("order_id")
                .n_unique()
                .cast(DataType::Int64)
                .alias("order_count"),
        ])
        .collect()?;

    let skus = string_column(&df, "sku_id")?;
    let quantities = i64_column(&df, "quantity")?;
    let order_counts = i64_column(&df, "order_count")?;

    Ok(skus
        .into_iter()
        .zip(quantities)
        .zip(order_counts)
        .map(|((sku_id, quantity), order_count)| ProductAggregate {
            sku_id: sku_id.unwrap_or_default(),
            quantity,
            order_count,
        })
        .collect())
}

/// Header revenue by the region of the order's customer
fn region_aggregates(frames: &Frames) -> Result<Vec<RegionAggregate>> {
    let df = frames
        .headers
        .clone()
        .lazy()
        .join(
            frames.customers.clone().lazy(),
            [col("customer_id")],
            [col("customer_id")],
            JoinArgs::new(JoinType::Left),
        )
        .group_by([col("region")])
        .agg([
            len().cast(DataType::Int64).alias("order_count"),
            col("total_amount").sum().alias("revenue"),
        ])
        .collect()?;

    let regions = string_column(&df, "region")?;
    let order_counts = i64_column(&df, "order_count")?;
    let revenues = i64_column(&df, "revenue")?;

    Ok(regions
        .into_iter()
        .zip(order_counts)
        .zip(revenues)
        .map(|((region, order_count), revenue)| RegionAggregate {
            region,
            order_count,
            revenue,
        })
        .collect())
}

/// Headers with their order time shifted by `offset_millis` as a datetime
fn with_local_time(headers: LazyFrame, offset_millis: i64) -> LazyFrame {
    headers.with_column(
        (col("ordered_at") + lit(offset_millis))
            .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
            .alias("local_time"),
    )
}

/// Header revenue by calendar month of the local order time
fn month_aggregates(headers: LazyFrame, offset_millis: i64) -> Result<Vec<MonthAggregate>> {
    let df = with_local_time(headers, offset_millis)
        .group_by([
            col("local_time").dt().year().cast(DataType::Int64).alias("year"),
            col("local_time").dt().month().cast(DataType::Int64).alias("month"),
        ])
        .agg([
            len().cast(DataType::Int64).alias("order_count"),
            col("total_amount").sum().alias("revenue"),
        ])
        .collect()?;

    let years = i64_column(&df, "year")?;
    let months = i64_column(&df, "month")?;
    let order_counts = i64_column(&df, "order_count")?;
    let revenues = i64_column(&df, "revenue")?;

    Ok(years
        .into_iter()
        .zip(months)
        .zip(order_counts)
        .zip(revenues)
        .map(|(((year, month), order_count), revenue)| MonthAggregate {
            year: year as i32,
            month: month as u32,
            order_count,
            revenue,
        })
        .collect())
}

/// Orders per local weekday; polars counts ISO weekdays from 1
fn weekday_aggregates(headers: LazyFrame, offset_millis: i64) -> Result<Vec<WeekdayAggregate>> {
    let df = with_local_time(headers, offset_millis)
        .group_by([(col("local_time").dt().weekday().cast(DataType::Int64) - lit(1i64))
            .alias("weekday")])
        .agg([len().cast(DataType::Int64).alias("order_count")])
        .collect()?;

    let weekdays = i64_column(&df, "weekday")?;
    let order_counts = i64_column(&df, "order_count")?;

    Ok(weekdays
        .into_iter()
        .zip(order_counts)
        .map(|(weekday, order_count)| WeekdayAggregate {
            weekday: weekday as u32,
            order_count,
        })
        .collect())
}

/// Orders per local hour of day
fn hour_aggregates(headers: LazyFrame, offset_millis: i64) -> Result<Vec<HourAggregate>> {
    let df = with_local_time(headers, offset_millis)
        .group_by([col("local_time")
            .dt()
            .hour()
            .cast(DataType::Int64)
            .alias("hour")])
        .agg([len().cast(DataType::Int64).alias("order_count")])
        .collect()?;

    let hours = i64_column(&df, "hour")?;
    let order_counts = i64_column(&df, "order_count")?;

    Ok(hours
        .into_iter()
        .zip(order_counts)
        .map(|(hour, order_count)| HourAggregate {
            hour: hour as u32,
            order_count,
        })
        .collect())
}

/// First value of an integer column, `None` when null
fn scalar(df: &DataFrame, name: &str) -> Result<Option<i64>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.get(0))
}

fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
