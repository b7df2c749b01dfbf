//! Session-side models for the storefront.
//!
//! Everything the shop sells or tracks lives in the backend; the only state
//! kept here is who is signed in, their backend cookies, the cart mirror and
//! pending flash messages.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
