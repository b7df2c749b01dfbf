//! Server-side cart.

use serde_json::json;
use tidewater_core::SkuId;
use tracing::instrument;

use crate::client::{ApiSession, take};
use crate::error::ApiError;
use crate::types::{Cart, CheckoutInput, PlacedOrder};

impl ApiSession<'_> {
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn cart(&mut self) -> Result<Cart, ApiError> {
        let value = self.get("/api/cart").await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Number of items in the cart, for the navigation badge.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn cart_count(&mut self) -> Result<u32, ApiError> {
        let value = self.get("/api/cart/count").await?;
        take(value, "count")
    }

    /// # Errors
    ///
    /// Returns an error if the SKU is unavailable or out of stock.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&mut self, sku_id: SkuId, quantity: u32) -> Result<Cart, ApiError> {
        let value = self
            .post(
                "/api/cart/add",
                &json!({ "product_sku_id": sku_id, "quantity": quantity }),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// Returns an error if the quantity exceeds available stock.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &mut self,
        sku_id: SkuId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let value = self
            .put(
                "/api/cart/update",
                &json!({ "product_sku_id": sku_id, "quantity": quantity }),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&mut self, sku_id: SkuId) -> Result<Cart, ApiError> {
        let value = self
            .delete_with("/api/cart/remove", &json!({ "product_sku_id": sku_id }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&mut self) -> Result<Cart, ApiError> {
        let value = self.delete("/api/cart/clear").await?;
        if value.is_null() {
            return Ok(Cart::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Turn the cart into an order. The backend empties the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or stock ran out.
    #[instrument(skip(self, input), fields(address_id = %input.address_id))]
    pub async fn checkout(&mut self, input: &CheckoutInput) -> Result<PlacedOrder, ApiError> {
        let value = self.post("/api/cart/checkout", input).await?;
        take(value, "order")
    }
}
