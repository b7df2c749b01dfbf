//! Status enums for backend-owned state machines.
//!
//! The backend decides every transition. These enums only name the states
//! the backend reports so pages can pick a label, a badge colour and which
//! action buttons to offer. Values the backend adds later deserialize as
//! `Unknown` instead of failing the whole page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Every status the backend reports, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire value sent to and received from the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Look up a known status by its wire value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Fallback label when the backend's status list is unavailable.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge badge-yellow",
            Self::Confirmed => "badge badge-blue",
            Self::Processing => "badge badge-purple",
            Self::Shipped => "badge badge-indigo",
            Self::Delivered => "badge badge-green",
            Self::Completed | Self::Unknown => "badge badge-gray",
            Self::Cancelled => "badge badge-red",
        }
    }

    /// Whether the cancel action is offered.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether the complete action is offered.
    #[must_use]
    pub const fn is_completable(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipment fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Preparing,
    Packed,
    Shipped,
    Delivered,
    #[serde(other)]
    Unknown,
}

impl ShipmentStatus {
    pub const ALL: [Self; 4] = [Self::Preparing, Self::Packed, Self::Shipped, Self::Delivered];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Packed => "packed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Unknown => "unknown",
        }
    }

    /// Look up a known status by its wire value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Preparing => "Preparing",
            Self::Packed => "Packed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Unknown => "Unknown",
        }
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Preparing => "badge badge-yellow",
            Self::Packed => "badge badge-blue",
            Self::Shipped => "badge badge-indigo",
            Self::Delivered => "badge badge-green",
            Self::Unknown => "badge badge-gray",
        }
    }

    /// Items can be picked and the shipment packed only while preparing.
    #[must_use]
    pub const fn can_pick(&self) -> bool {
        matches!(self, Self::Preparing)
    }

    /// Whether the ship action (with carrier and tracking) is offered.
    #[must_use]
    pub const fn can_ship(&self) -> bool {
        matches!(self, Self::Packed)
    }

    /// Whether the deliver action is offered.
    #[must_use]
    pub const fn can_deliver(&self) -> bool {
        matches!(self, Self::Shipped)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of stock movement recorded in the inventory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryEventType {
    Inbound,
    Outbound,
    Adjustment,
    Allocation,
    Deallocation,
    #[serde(other)]
    Unknown,
}

impl InventoryEventType {
    /// Every filterable event type, in display order.
    pub const ALL: [Self; 5] = [
        Self::Inbound,
        Self::Outbound,
        Self::Adjustment,
        Self::Allocation,
        Self::Deallocation,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Adjustment => "adjustment",
            Self::Allocation => "allocation",
            Self::Deallocation => "deallocation",
            Self::Unknown => "unknown",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inbound => "Received",
            Self::Outbound => "Shipped out",
            Self::Adjustment => "Adjustment",
            Self::Allocation => "Allocated",
            Self::Deallocation => "Released",
            Self::Unknown => "Other",
        }
    }
}

/// Reason an inventory alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    #[serde(other)]
    Unknown,
}

impl AlertType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Unknown => "unknown",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LowStock => "Low stock",
            Self::OutOfStock => "Out of stock",
            Self::Unknown => "Other",
        }
    }

    /// CSS classes for the alert badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::LowStock => "badge badge-yellow",
            Self::OutOfStock => "badge badge-red",
            Self::Unknown => "badge badge-gray",
        }
    }
}

/// Kind of delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Home,
    Office,
    Other,
}

impl AddressType {
    /// Every address type, in display order.
    pub const ALL: [Self; 3] = [Self::Home, Self::Office, Self::Other];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Office => "office",
            Self::Other => "other",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Office => "Office",
            Self::Other => "Other",
        }
    }
}

/// Role of a backend user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(other)]
    Customer,
}

impl UserRole {
    /// Whether the account may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_only_knows_real_states() {
        assert_eq!(OrderStatus::from_wire("delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::from_wire("unknown"), None);
        assert_eq!(ShipmentStatus::from_wire("packed"), Some(ShipmentStatus::Packed));
        assert_eq!(ShipmentStatus::from_wire(""), None);
    }

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(status, OrderStatus::Confirmed);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let status: OrderStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        let status: ShipmentStatus = serde_json::from_str("\"lost\"").unwrap();
        assert_eq!(status, ShipmentStatus::Unknown);
    }

    #[test]
    fn test_order_actions_follow_status() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(OrderStatus::Delivered.is_completable());
        assert!(!OrderStatus::Completed.is_completable());
    }

    #[test]
    fn test_shipment_actions_follow_status() {
        assert!(ShipmentStatus::Preparing.can_pick());
        assert!(!ShipmentStatus::Preparing.can_ship());
        assert!(ShipmentStatus::Packed.can_ship());
        assert!(ShipmentStatus::Shipped.can_deliver());
        assert!(!ShipmentStatus::Delivered.can_deliver());
    }

    #[test]
    fn test_alert_type_wire_format() {
        let alert: AlertType = serde_json::from_str("\"out_of_stock\"").unwrap();
        assert_eq!(alert, AlertType::OutOfStock);
        assert_eq!(alert.as_str(), "out_of_stock");
    }

    #[test]
    fn test_user_role_defaults_to_customer() {
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
        let role: UserRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, UserRole::Customer);
    }
}
