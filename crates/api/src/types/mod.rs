//! Read-only projections of backend records, plus request payloads.
//!
//! Field names follow the backend's snake_case JSON. Optional relations
//! (`category`, `skus`, `items` ...) are only present when the endpoint eager
//! loads them, so they default to `None`/empty.

mod cart;
mod catalog;
mod customer;
mod inventory;
mod order;

pub use cart::*;
pub use catalog::*;
pub use customer::*;
pub use inventory::*;
pub use order::*;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tidewater_core::{UserId, UserRole};

/// Deserialize a backend timestamp.
///
/// Accepts RFC 3339 (`2026-03-01T09:30:00.000000Z`), `Y-m-d H:i:s` (taken
/// as UTC) and bare dates. Anything else, including `null`, becomes `None`
/// so one odd value never breaks a page.
pub(crate) fn timestamp<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.as_deref().map(str::trim).and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page: 0,
            total: 0,
        }
    }
}

impl Pagination {
    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    #[must_use]
    pub const fn prev_page(&self) -> u32 {
        self.current_page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.current_page.saturating_add(1)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A `{value, label}` option served by the backend (order statuses,
/// payment methods, shipment statuses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

/// A user reference embedded in other records (performer, packer ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_navigation() {
        let p = Pagination {
            current_page: 2,
            last_page: 3,
            per_page: 20,
            total: 45,
        };
        assert!(p.has_prev());
        assert!(p.has_next());
        assert_eq!(p.prev_page(), 1);
        assert_eq!(p.next_page(), 3);

        let last = Pagination {
            current_page: 3,
            ..p
        };
        assert!(!last.has_next());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let iso = parse_timestamp("2026-03-01T09:30:00.000000Z").unwrap();
        let plain = parse_timestamp("2026-03-01 09:30:00").unwrap();
        assert_eq!(iso, plain);
        assert!(parse_timestamp("2026-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_user_role_defaults_to_customer() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"name":"Aoi","email":"aoi@example.com"}"#).unwrap();
        assert!(!user.role.is_admin());

        let admin: User = serde_json::from_str(
            r#"{"id":2,"name":"Ren","email":"ren@example.com","role":"admin"}"#,
        )
        .unwrap();
        assert!(admin.role.is_admin());
    }
}
