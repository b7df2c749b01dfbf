//! Core types for Tidewater.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod form;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use form::{PairListError, empty_as_none, parse_pair_list};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
