//! Field parsing utilities for raw source rows
//!
//! Each parser maps raw text to a [`FieldValue`]: blank text is `Missing`,
//! unparseable text is `Malformed` with the raw value kept.

use crate::app::models::FieldValue;
use crate::constants::{MINOR_UNITS_PER_MAJOR, NAIVE_DATETIME_FORMATS, OFFSET_DATETIME_FORMATS};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Placeholder text some exports use for an empty cell
const NULL_MARKERS: &[&str] = &["nan", "null", "none", "n/a"];

/// Trim a raw cell; blank or placeholder text becomes `None`
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !NULL_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)))
        .map(str::to_string)
}

/// Parse an order timestamp
///
/// Timestamps with an explicit offset keep it; naive ones are interpreted in
/// `offset`. The result is always UTC.
pub fn parse_timestamp(raw: Option<&str>, offset: FixedOffset) -> FieldValue<DateTime<Utc>> {
    let Some(value) = clean_text(raw) else {
        return FieldValue::Missing;
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
        return FieldValue::Present(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&value, format) {
            return FieldValue::Present(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&value, format) {
            // Fixed offsets have no gaps, so the local time is never ambiguous
            if let Some(local) = offset.from_local_datetime(&naive).single() {
                return FieldValue::Present(local.with_timezone(&Utc));
            }
        }
    }

    FieldValue::Malformed(value)
}

/// Parse a quantity; integral decimals such as `3.0` are accepted
///
/// Sign is not checked here: zero and negative quantities are rejected by the
/// validator with their own reason.
pub fn parse_quantity(raw: Option<&str>) -> FieldValue<i64> {
    let Some(value) = clean_text(raw) else {
        return FieldValue::Missing;
    };

    if let Ok(quantity) = value.parse::<i64>() {
        return FieldValue::Present(quantity);
    }

    match value.parse::<f64>() {
        Ok(float) if float.is_finite() && float.fract() == 0.0 && float.abs() < 1e15 => {
            FieldValue::Present(float as i64)
        }
        _ => FieldValue::Malformed(value),
    }
}

/// Parse a currency amount into minor units, rounding half away from zero
pub fn parse_amount(raw: Option<&str>) -> FieldValue<i64> {
    let Some(value) = clean_text(raw) else {
        return FieldValue::Missing;
    };

    let stripped: String = value.chars().filter(|c| *c != ',').collect();

    if let Some(minor) = parse_decimal_minor_units(&stripped) {
        return FieldValue::Present(minor);
    }

    match stripped.parse::<f64>() {
        Ok(float) if float.is_finite() && float.abs() < 1e15 => {
            FieldValue::Present((float * MINOR_UNITS_PER_MAJOR as f64).round() as i64)
        }
        _ => FieldValue::Malformed(value),
    }
}

/// Exact decimal parse of `[-+]digits[.digits]` into minor units
fn parse_decimal_minor_units(value: &str) -> Option<i64> {
    let (negative, unsigned) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    // Two digits of cents, the third decides rounding
    let digits: Vec<i64> = fraction
        .chars()
        .take(3)
        .filter_map(|c| c.to_digit(10).map(i64::from))
        .collect();
    let tenths = digits.first().copied().unwrap_or(0);
    let hundredths = digits.get(1).copied().unwrap_or(0);
    let round_up = digits.get(2).is_some_and(|d| *d >= 5);

    let magnitude = whole_value
        .checked_mul(MINOR_UNITS_PER_MAJOR)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

    Some(if negative { -magnitude } else { magnitude })
}

/// Title-case words separated by whitespace, collapsing runs of spaces
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
