//! Tidewater Core - Shared types library.
//!
//! This crate provides common types used across all Tidewater components:
//! - `api` - Client for the remote commerce backend
//! - `storefront` - Customer-facing shop
//! - `admin` - Back-office console for catalog, stock, orders and shipments
//!
//! # Architecture
//!
//! The core crate contains only types and helpers - no I/O and no HTTP
//! clients. The backend owns every entity; these types describe the shapes
//! the backend sends and accepts.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, statuses and form helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
