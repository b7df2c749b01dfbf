//! Session-side models for the admin console.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
