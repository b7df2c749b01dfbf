//! Stock levels, the stock ledger and low-stock alerts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidewater_core::{
    AlertId, AlertType, InventoryEventType, InventoryId, ProductId, SkuId, TransactionId,
};

use super::UserSummary;

/// Product summary embedded in an inventory SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub product_code: Option<String>,
}

/// SKU summary embedded in an inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySku {
    pub id: SkuId,
    pub sku_code: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub product: Option<InventoryProduct>,
}

/// Stock for one SKU.
///
/// `available_quantity` is computed by the backend
/// (`quantity - allocated_quantity`) and shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub product_sku_id: SkuId,
    pub quantity: i64,
    pub allocated_quantity: i64,
    pub available_quantity: i64,
    #[serde(default)]
    pub safety_stock: i64,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_sku: Option<InventorySku>,
}

impl Inventory {
    /// Whether available stock is at or below the safety stock level.
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.available_quantity <= self.safety_stock
    }

    #[must_use]
    pub fn sku_code(&self) -> &str {
        self.product_sku.as_ref().map_or("", |sku| sku.sku_code.as_str())
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        self.product_sku
            .as_ref()
            .and_then(|sku| sku.product.as_ref())
            .map_or("", |p| p.name.as_str())
    }
}

/// One entry in the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: TransactionId,
    pub inventory_id: InventoryId,
    pub event_type: InventoryEventType,
    pub quantity_change: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performer: Option<UserSummary>,
}

/// A low-stock or out-of-stock alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAlert {
    pub id: AlertId,
    pub inventory_id: InventoryId,
    pub alert_type: AlertType,
    pub threshold_quantity: i64,
    pub current_quantity: i64,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inventory: Option<Inventory>,
}

/// Stock filter for the inventory list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    LowStock,
    OutOfStock,
}

impl StockFilter {
    pub const ALL: [Self; 2] = [Self::LowStock, Self::OutOfStock];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LowStock => "Low stock",
            Self::OutOfStock => "Out of stock",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StockFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<InventoryEventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertQuery {
    /// Sent as `1` so Laravel's boolean validation accepts it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Payload for `POST /api/inventories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewInventory {
    pub product_sku_id: SkuId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_stock: Option<i64>,
}

/// Payload for `POST /api/inventories/adjust`. The change may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub product_sku_id: SkuId,
    pub quantity_change: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload for `POST /api/inventories/receive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReceipt {
    pub product_sku_id: SkuId,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_with_nested_sku() {
        let inv: Inventory = serde_json::from_str(
            r#"{"id":3,"product_sku_id":10,"quantity":12,"allocated_quantity":4,
                "available_quantity":8,"safety_stock":10,
                "product_sku":{"id":10,"sku_code":"TW-001-M","price":"4800.00",
                  "product":{"id":5,"name":"Linen Shirt","product_code":"TW-001"}}}"#,
        )
        .unwrap();
        assert_eq!(inv.sku_code(), "TW-001-M");
        assert_eq!(inv.product_name(), "Linen Shirt");
        assert!(inv.is_low());
    }

    #[test]
    fn test_transaction_unknown_event_type() {
        let tx: InventoryTransaction = serde_json::from_str(
            r#"{"id":1,"inventory_id":3,"event_type":"recount","quantity_change":-2,
                "quantity_before":10,"quantity_after":8}"#,
        )
        .unwrap();
        assert_eq!(tx.event_type, InventoryEventType::Unknown);
    }

    #[test]
    fn test_alert_query_serialization() {
        let q = AlertQuery {
            unresolved: Some(1),
            alert_type: Some(AlertType::OutOfStock),
            ..AlertQuery::default()
        };
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            serde_json::json!({"unresolved": 1, "alert_type": "out_of_stock"})
        );
    }
}
