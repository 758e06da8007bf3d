//! Deduplication of order line items and customers
//!
//! The order source repeats order-level fields (customer, timestamp, total
//! amount) on every line item. Summing amounts over lines inflates revenue by
//! the fan-out factor, so revenue is only ever computed over the
//! [`OrderHeader`]s this module derives: one per order, taken from the first
//! line of a group whose lines all agree on the order-level fields.
//!
//! Groups that disagree are integrity violations. The whole order is excluded
//! and reported; nothing is averaged or guessed.
//!
//! # Components
//!
//! - [`orders`] - Group-verify-pick-first derivation of order headers
//! - [`customers`] - Collapse of repeated customer ids and contact conflicts
//!
//! [`OrderHeader`]: crate::app::models::OrderHeader

pub mod customers;
pub mod orders;

#[cfg(test)]
pub mod tests;

pub use customers::{CustomerCollapse, collapse_customers};
pub use orders::{
    DedupOutcome, FanOutReport, FieldDivergence, IntegrityViolation, analyze_fan_out, dedupe,
};
