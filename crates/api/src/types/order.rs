//! Orders, order items and shipments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidewater_core::{
    AddressId, ImageId, OrderId, OrderItemId, OrderStatus, Price, ProductId, ShipmentId,
    ShipmentItemId, ShipmentStatus, SkuId, UserId,
};

use super::UserSummary;

/// Image reference embedded in an order item's product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemImage {
    pub id: ImageId,
    pub image_path: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<OrderItemImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRef {
    pub id: SkuId,
    pub sku_code: String,
}

/// One line of an order, frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_sku_id: Option<SkuId>,
    pub product_name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub other_attribute: Option<String>,
    pub quantity: i64,
    pub purchase_unit_price: Decimal,
    #[serde(default)]
    pub purchase_tax_rate: Decimal,
    pub purchase_subtotal: Decimal,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product: Option<OrderItemProduct>,
    #[serde(default)]
    pub product_sku: Option<SkuRef>,
    #[serde(default)]
    pub shipped_quantity: Option<i64>,
    #[serde(default)]
    pub unshipped_quantity: Option<i64>,
}

impl OrderItem {
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::from_amount(self.purchase_unit_price)
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::from_amount(self.purchase_subtotal)
    }

    #[must_use]
    pub fn variant_label(&self) -> String {
        [&self.size, &self.color, &self.other_attribute]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    #[must_use]
    pub fn sku_code(&self) -> &str {
        self.product_sku.as_ref().map_or("", |sku| sku.sku_code.as_str())
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    #[serde(default)]
    pub user_address_id: Option<AddressId>,
    pub payment_method: String,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub order_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total_price: Decimal,
    pub shipping_name: String,
    #[serde(default)]
    pub shipping_name_kana: Option<String>,
    pub shipping_postal_code: String,
    pub shipping_prefecture: String,
    pub shipping_city: String,
    pub shipping_address_line1: String,
    #[serde(default)]
    pub shipping_address_line2: Option<String>,
    pub shipping_phone: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

impl Order {
    #[must_use]
    pub fn subtotal_price(&self) -> Price {
        Price::from_amount(self.subtotal)
    }

    #[must_use]
    pub fn shipping_fee_price(&self) -> Price {
        Price::from_amount(self.shipping_fee)
    }

    #[must_use]
    pub fn total(&self) -> Price {
        Price::from_amount(self.total_price)
    }

    /// Items with quantity still waiting for a shipment.
    #[must_use]
    pub fn unshipped_items(&self) -> Vec<&OrderItem> {
        self.items
            .iter()
            .filter(|item| item.unshipped_quantity.is_some_and(|q| q > 0))
            .collect()
    }
}

/// One line of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub id: ShipmentItemId,
    pub shipment_id: ShipmentId,
    pub order_item_id: OrderItemId,
    #[serde(default)]
    pub product_sku_id: Option<SkuId>,
    pub quantity: i64,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub picked_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub packed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_item: Option<OrderItem>,
    #[serde(default)]
    pub product_sku: Option<SkuRef>,
}

impl ShipmentItem {
    #[must_use]
    pub const fn is_picked(&self) -> bool {
        self.picked_at.is_some()
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        self.order_item
            .as_ref()
            .map_or("", |item| item.product_name.as_str())
    }

    #[must_use]
    pub fn sku_code(&self) -> &str {
        self.product_sku.as_ref().map_or("", |sku| sku.sku_code.as_str())
    }
}

/// A shipment for (part of) an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub shipment_number: String,
    pub order_id: OrderId,
    #[serde(default)]
    pub shipping_carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub shipping_date: Option<DateTime<Utc>>,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<ShipmentItem>,
    #[serde(default)]
    pub order: Option<Box<Order>>,
    #[serde(default)]
    pub packer: Option<UserSummary>,
    #[serde(default)]
    pub shipper: Option<UserSummary>,
}

impl Shipment {
    /// Whether every item has been picked.
    #[must_use]
    pub fn all_picked(&self) -> bool {
        self.items.iter().all(ShipmentItem::is_picked)
    }
}

/// Filters for order lists (admin and "my orders").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
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
pub struct ShipmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_sku_id: SkuId,
    pub quantity: u32,
}

/// Payload for `POST /api/orders` (admin-created orders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub address_id: AddressId,
    pub payment_method: String,
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShipmentLine {
    pub order_item_id: OrderItemId,
    pub quantity: u32,
}

/// Payload for `POST /api/admin/shipments` (partial shipment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub items: Vec<ShipmentLine>,
}

/// Carrier and tracking number, sent when shipping or editing tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserializes_with_items_and_shipments() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 42, "order_number": "ORD-20260301-0042", "user_id": 7,
                "user_address_id": 3, "payment_method": "credit_card",
                "order_date": "2026-03-01 10:00:00", "status": "confirmed",
                "subtotal": "9600.00", "shipping_fee": "0.00", "total_price": "9600.00",
                "shipping_name": "Aoi Tanaka", "shipping_postal_code": "150-0001",
                "shipping_prefecture": "Tokyo", "shipping_city": "Shibuya",
                "shipping_address_line1": "1-2-3 Jingumae", "shipping_phone": "03-0000-0000",
                "items": [{"id": 1, "order_id": 42, "product_sku_id": 10, "product_name": "Linen Shirt",
                           "size": "M", "color": "Navy", "quantity": 2, "purchase_unit_price": 4800,
                           "purchase_tax_rate": 10, "purchase_subtotal": 9600,
                           "shipped_quantity": 0, "unshipped_quantity": 2}],
                "shipments": [{"id": 9, "shipment_number": "SHP-0009", "order_id": 42,
                               "status": "preparing", "items": []}]
            }"#,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.status.is_cancellable());
        assert_eq!(order.total().display(), "¥9,600");
        assert_eq!(order.items[0].variant_label(), "M / Navy");
        assert_eq!(order.unshipped_items().len(), 1);
        assert_eq!(order.shipments[0].status, ShipmentStatus::Preparing);
    }

    #[test]
    fn test_new_order_payload() {
        let order = NewOrder {
            address_id: AddressId::new(3),
            payment_method: "bank_transfer".to_string(),
            items: vec![OrderLine {
                product_sku_id: SkuId::new(10),
                quantity: 2,
            }],
            note: None,
        };
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            serde_json::json!({
                "address_id": 3,
                "payment_method": "bank_transfer",
                "items": [{"product_sku_id": 10, "quantity": 2}]
            })
        );
    }

    #[test]
    fn test_shipment_all_picked() {
        let shipment: Shipment = serde_json::from_str(
            r#"{"id": 9, "shipment_number": "SHP-0009", "order_id": 42, "status": "preparing",
                "items": [
                  {"id": 1, "shipment_id": 9, "order_item_id": 1, "quantity": 1, "picked_at": "2026-03-02T01:00:00Z"},
                  {"id": 2, "shipment_id": 9, "order_item_id": 2, "quantity": 1, "picked_at": null}
                ]}"#,
        )
        .unwrap();
        assert!(!shipment.all_picked());
    }
}
