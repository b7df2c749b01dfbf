//! Tidewater backend API client.
//!
//! Every entity the shop shows (products, stock, orders, shipments, carts,
//! addresses) is owned by a remote Laravel/Sanctum backend. This crate is
//! the one place that talks to it.
//!
//! # Architecture
//!
//! - [`ApiClient`] holds a single `reqwest::Client` and the backend base URL
//! - [`CookieJar`] is the per-visitor backend cookie set (session cookie and
//!   `XSRF-TOKEN`); the web binaries keep it in their own session store
//! - [`ApiSession`] pairs the client with one visitor's jar; every request
//!   sends the jar, copies the CSRF token into `X-XSRF-TOKEN`, and absorbs
//!   `Set-Cookie` headers from the response
//! - Resource methods live in one module per endpoint family, each adding an
//!   `impl ApiSession` block
//!
//! The backend decides everything. Nothing here validates stock, totals or
//! state transitions; values are rendered exactly as received.
//!
//! # Example
//!
//! ```rust,ignore
//! use tidewater_api::{ApiClient, ApiConfig, CookieJar};
//!
//! let client = ApiClient::new(&config)?;
//! let mut jar = CookieJar::default();
//! let mut api = client.session(&mut jar);
//!
//! let user = api.login(&email, &password).await?;
//! let cart = api.add_to_cart(sku_id, 2).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod cookies;
mod error;
mod resources;
pub mod types;

pub use client::{ApiClient, ApiConfig, ApiSession};
pub use cookies::{CookieJar, XSRF_COOKIE};
pub use error::ApiError;
pub use types::*;
