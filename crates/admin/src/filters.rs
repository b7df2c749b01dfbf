//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a stock movement with an explicit sign.
///
/// Usage in templates: `{{ tx.quantity_change|signed }}`
#[askama::filter_fn]
pub fn signed(
    value: impl std::borrow::Borrow<i64>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(format_signed(*value.borrow()))
}

fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}
