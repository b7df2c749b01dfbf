//! Helpers for decoding HTML form input.
//!
//! Browsers submit empty inputs as `field=`; `serde_urlencoded` would fail
//! to parse that as a number, so optional numeric fields go through
//! [`empty_as_none`].

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Deserialize an optional form value, treating a blank string as `None`.
///
/// # Errors
///
/// Returns a deserialization error when the non-blank value does not parse.
pub fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = Option::<String>::deserialize(de)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Error parsing an `id:quantity` list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairListError {
    /// An entry is missing the `:` separator.
    #[error("entry '{0}' must look like id:quantity")]
    MissingSeparator(String),
    /// The ID part is not a number.
    #[error("'{0}' is not a valid ID")]
    InvalidId(String),
    /// The quantity part is not a positive number.
    #[error("'{0}' is not a valid quantity")]
    InvalidQuantity(String),
    /// No entries were given.
    #[error("enter at least one id:quantity entry")]
    Empty,
}

/// Parse `id:quantity` pairs separated by commas or newlines.
///
/// Blank entries are skipped. Quantities must be at least 1.
///
/// # Errors
///
/// Returns `PairListError` for the first malformed entry, or `Empty` when
/// nothing remains after skipping blanks.
pub fn parse_pair_list<I>(input: &str) -> Result<Vec<(I, u32)>, PairListError>
where
    I: FromStr,
{
    let mut pairs = Vec::new();
    for entry in input.split([',', '\n']).map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let (id, qty) = entry
            .split_once(':')
            .ok_or_else(|| PairListError::MissingSeparator(entry.to_string()))?;
        let id = id
            .trim()
            .parse::<I>()
            .map_err(|_| PairListError::InvalidId(id.trim().to_string()))?;
        let qty = qty
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| PairListError::InvalidQuantity(qty.trim().to_string()))?;
        pairs.push((id, qty));
    }

    if pairs.is_empty() {
        return Err(PairListError::Empty);
    }
    Ok(pairs)
}
