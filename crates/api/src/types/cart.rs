//! Server-side cart contents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidewater_core::{AddressId, CategoryId, OrderId, Price, ProductId, SkuId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCategory {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartImage {
    pub image_path: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemProduct {
    pub id: ProductId,
    pub name: String,
    pub product_code: String,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub category: Option<CartCategory>,
    #[serde(default)]
    pub main_image: Option<CartImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemSku {
    pub id: SkuId,
    pub sku_code: String,
    pub price: Decimal,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub other_attribute: Option<String>,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_sku_id: SkuId,
    pub quantity: u32,
    pub product: CartItemProduct,
    pub sku: CartItemSku,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

const fn default_true() -> bool {
    true
}

impl CartItem {
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::from_amount(self.sku.price)
    }

    /// Unit price times quantity, for the line column only. Order totals
    /// always come from [`CartTotals`].
    #[must_use]
    pub fn line_price(&self) -> Price {
        Price::from_amount(self.sku.price * Decimal::from(self.quantity))
    }

    #[must_use]
    pub fn variant_label(&self) -> String {
        [&self.sku.size, &self.sku.color, &self.sku.other_attribute]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Totals computed by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total_price: Decimal,
    pub item_count: u32,
}

impl CartTotals {
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
}

/// Response of every cart endpoint except `count` and `checkout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub totals: CartTotals,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any line can no longer be bought (inactive SKU or stock
    /// below the requested quantity, as reported by the backend).
    #[must_use]
    pub fn has_unavailable_items(&self) -> bool {
        self.items.iter().any(|item| !item.is_available)
    }
}

/// Payload for `POST /api/cart/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutInput {
    pub address_id: AddressId,
    pub payment_method: String,
    pub note: Option<String>,
}

/// The order a checkout created. Only what a confirmation needs is read, so
/// a trimmed or extended order body still counts as placed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_response() {
        let cart: Cart = serde_json::from_str(
            r#"{
                "items": [{
                    "product_sku_id": 10, "quantity": 2,
                    "product": {"id": 5, "name": "Linen Shirt", "product_code": "TW-001",
                                "tax_rate": 10, "category": null,
                                "main_image": {"image_path": "/b.jpg", "alt_text": null}},
                    "sku": {"id": 10, "sku_code": "TW-001-M", "price": 4800, "size": "M", "color": null},
                    "available_quantity": 1, "is_available": false
                }],
                "totals": {"subtotal": 9600, "shipping_fee": 500, "total_price": 10100, "item_count": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(cart.items[0].line_price().display(), "¥9,600");
        assert_eq!(cart.totals.total().display(), "¥10,100");
        assert!(cart.has_unavailable_items());
        assert_eq!(cart.items[0].variant_label(), "M");
    }

    #[test]
    fn test_empty_cart_response() {
        let cart: Cart = serde_json::from_str(
            r#"{"items": [], "totals": {"subtotal": 0, "shipping_fee": 0, "total_price": 0, "item_count": 0}}"#,
        )
        .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart, Cart::default());
    }

    #[test]
    fn test_placed_order_ignores_other_fields() {
        let order: PlacedOrder = serde_json::from_str(
            r#"{"id": 42, "order_number": "TW-20261019-0042", "status": "pending", "items": null}"#,
        )
        .unwrap();
        assert_eq!(order.id, OrderId::new(42));
        assert_eq!(order.order_number, "TW-20261019-0042");

        let order: PlacedOrder = serde_json::from_str(r#"{"id": 43}"#).unwrap();
        assert!(order.order_number.is_empty());
    }
}
