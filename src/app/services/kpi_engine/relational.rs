//! Relational KPI backend built on an in-memory SQLite database
//!
//! Loads customers and raw line items, then derives order headers in SQL: a
//! `GROUP BY order_id` view reduces each order with `MIN()` and keeps only
//! groups whose customer, timestamp and amount each have exactly one distinct
//! value. Every aggregate reads from that view, never from line amounts.

use super::AggregationBackend;
use super::contract::{
    Aggregates, CustomerAggregate, HourAggregate, MonthAggregate, ProductAggregate,
    RegionAggregate, WeekdayAggregate,
};
use crate::Result;
use crate::app::models::CleanDataset;
use crate::config::KpiConfig;
use rusqlite::{Connection, Params, Row, params};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE customers (
    customer_id   TEXT PRIMARY KEY,
    customer_name TEXT NOT NULL,
    mobile_number TEXT NOT NULL,
    region        TEXT
);

CREATE TABLE order_lines (
    line_id       INTEGER PRIMARY KEY,
    order_id      TEXT NOT NULL,
    customer_id   TEXT NOT NULL,
    mobile_number TEXT,
    ordered_at    INTEGER NOT NULL,
    sku_id        TEXT NOT NULL,
    sku_count     INTEGER NOT NULL,
    total_amount  INTEGER NOT NULL
);

CREATE INDEX idx_order_lines_order_id ON order_lines(order_id);

CREATE VIEW order_headers AS
SELECT order_id,
       MIN(customer_id)  AS customer_id,
       MIN(ordered_at)   AS ordered_at,
       MIN(total_amount) AS total_amount,
       COUNT(*)          AS line_count
FROM order_lines
GROUP BY order_id
HAVING COUNT(DISTINCT customer_id) = 1
   AND COUNT(DISTINCT ordered_at) = 1
   AND COUNT(DISTINCT total_amount) = 1;

CREATE VIEW kept_lines AS
SELECT *
FROM order_lines
WHERE order_id IN (SELECT order_id FROM order_headers);
"#;

const ORDER_SCALARS: &str = r#"
SELECT COUNT(*),
       COALESCE(SUM(total_amount), 0),
       MIN(total_amount),
       MAX(total_amount),
       MIN(ordered_at),
       MAX(ordered_at)
FROM order_headers
"#;

const LINE_SCALARS: &str = r#"
SELECT COUNT(*),
       COALESCE(SUM(sku_count), 0),
       COUNT(DISTINCT sku_id)
FROM kept_lines
"#;

const CUSTOMER_TOTALS: &str = r#"
WITH known_ids AS (
    SELECT customer_id FROM customers
    UNION
    SELECT customer_id FROM order_headers
)
SELECT k.customer_id,
       MIN(c.customer_name),
       MIN(c.region),
       COUNT(h.order_id),
       COALESCE(SUM(h.total_amount), 0)
FROM known_ids k
LEFT JOIN customers c ON c.customer_id = k.customer_id
LEFT JOIN order_headers h ON h.customer_id = k.customer_id
GROUP BY k.customer_id
"#;

const PRODUCT_TOTALS: &str = r#"
SELECT sku_id,
       SUM(sku_count),
       COUNT(DISTINCT order_id)
FROM kept_lines
GROUP BY sku_id
"#;

const REGION_TOTALS: &str = r#"
SELECT c.region,
       COUNT(*),
       SUM(h.total_amount)
FROM order_headers h
LEFT JOIN customers c ON c.customer_id = h.customer_id
GROUP BY c.region
"#;

// ?1 is the UTC offset in milliseconds; order times are epoch milliseconds
const MONTH_TOTALS: &str = r#"
SELECT CAST(strftime('%Y', (ordered_at + ?1) / 1000.0, 'unixepoch') AS INTEGER) AS year,
       CAST(strftime('%m', (ordered_at + ?1) / 1000.0, 'unixepoch') AS INTEGER) AS month,
       COUNT(*),
       SUM(total_amount)
FROM order_headers
GROUP BY year, month
"#;

// %w counts from Sunday; shift so Monday is 0
const WEEKDAY_TOTALS: &str = r#"
SELECT (CAST(strftime('%w', (ordered_at + ?1) / 1000.0, 'unixepoch') AS INTEGER) + 6) % 7
           AS weekday,
       COUNT(*)
FROM order_headers
GROUP BY weekday
"#;

const HOUR_TOTALS: &str = r#"
SELECT CAST(strftime('%H', (ordered_at + ?1) / 1000.0, 'unixepoch') AS INTEGER) AS hour,
       COUNT(*)
FROM order_headers
GROUP BY hour
"#;

/// SQLite aggregation over raw line items
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalBackend;

impl RelationalBackend {
    /// Open an in-memory database loaded with the dataset
    ///
    /// Order headers are ignored: the database derives its own.
    pub fn load(dataset: &CleanDataset) -> Result<Connection> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| crate::Error::sqlite("Failed to open in-memory database", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| crate::Error::sqlite("Failed to create schema", e))?;

        let tx = conn.transaction()?;
        {
            let mut insert_customer = tx.prepare(
                "INSERT INTO customers (customer_id, customer_name, mobile_number, region) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for customer in &dataset.customers {
                insert_customer.execute(params![
                    customer.customer_id,
                    customer.name,
                    customer.contact,
                    customer.region,
                ])?;
            }

            let mut insert_line = tx.prepare(
                "INSERT INTO order_lines \
                 (order_id, customer_id, mobile_number, ordered_at, sku_id, sku_count, total_amount) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for item in &dataset.items {
                insert_line.execute(params![
                    item.order_id,
                    item.customer_id,
                    item.contact,
                    item.ordered_at.timestamp_millis(),
                    item.sku_id,
                    item.quantity,
                    item.total_amount,
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "Loaded {} customers and {} line items into SQLite",
            dataset.customers.len(),
            dataset.items.len()
        );
        Ok(conn)
    }
}

impl AggregationBackend for RelationalBackend {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn aggregate(&self, dataset: &CleanDataset, config: &KpiConfig) -> Result<Aggregates> {
        let conn = Self::load(dataset)?;

        let customer_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;

        let (order_count, total_revenue, min_order_value, max_order_value, first, last) = conn
            .query_row(ORDER_SCALARS, [], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                ))
            })?;

        let (line_item_count, items_sold, unique_skus) =
            conn.query_row(LINE_SCALARS, [], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

        let customers = query_all(&conn, CUSTOMER_TOTALS, params![], |row| {
            Ok(CustomerAggregate {
                customer_id: row.get(0)?,
                name: row.get(1)?,
                region: row.get(2)?,
                order_count: row.get(3)?,
                revenue: row.get(4)?,
            })
        })?;

        let products = query_all(&conn, PRODUCT_TOTALS, params![], |row| {
            Ok(ProductAggregate {
                sku_id: row.get(0)?,
                quantity: row.get(1)?,
                order_count: row.get(2)?,
            })
        })?;

        let regions = query_all(&conn, REGION_TOTALS, params![], |row| {
            Ok(RegionAggregate {
                region: row.get(0)?,
                order_count: row.get(1)?,
                revenue: row.get(2)?,
            })
        })?;

        let offset_millis = config.offset_millis();
        let months = query_all(&conn, MONTH_TOTALS, params![offset_millis], |row| {
            Ok(MonthAggregate {
                year: row.get(0)?,
                month: row.get(1)?,
                order_count: row.get(2)?,
                revenue: row.get(3)?,
            })
        })?;

        let weekdays = query_all(&conn, WEEKDAY_TOTALS, params![offset_millis], |row| {
            Ok(WeekdayAggregate {
                weekday: row.get(0)?,
                order_count: row.get(1)?,
            })
        })?;

        let hours = query_all(&conn, HOUR_TOTALS, params![offset_millis], |row| {
            Ok(HourAggregate {
                hour: row.get(0)?,
                order_count: row.get(1)?,
            })
        })?;

        debug!(
            "Relational aggregates: {} orders, {} customers, {} products, {} regions, {} months",
            order_count,
            customers.len(),
            products.len(),
            regions.len(),
            months.len()
        );

        Ok(Aggregates {
            customer_count,
            order_count,
            line_item_count,
            items_sold,
            total_revenue,
            min_order_value,
            max_order_value,
            unique_skus,
            first_order_at: first,
            last_order_at: last,
            customers,
            products,
            regions,
            months,
            weekdays,
            hours,
        })
    }
}

/// Run a query and collect every mapped row
fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = conn.prepare(sql)?;
    let rows = statement
        .query_map(params, map)?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}
