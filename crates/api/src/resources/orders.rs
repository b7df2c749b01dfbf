//! Orders (customer and admin views).

use serde_json::json;
use tidewater_core::{OrderId, OrderStatus};
use tracing::instrument;

use crate::client::{ApiSession, take, take_page};
use crate::error::ApiError;
use crate::types::{Choice, NewOrder, Order, OrderQuery, Page};

impl ApiSession<'_> {
    /// Order statuses with backend labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn order_statuses(&mut self) -> Result<Vec<Choice>, ApiError> {
        let value = self.get("/api/orders/statuses").await?;
        take(value, "statuses")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn payment_methods(&mut self) -> Result<Vec<Choice>, ApiError> {
        let value = self.get("/api/orders/payment-methods").await?;
        take(value, "payment_methods")
    }

    /// The logged-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&mut self, query: &OrderQuery) -> Result<Page<Order>, ApiError> {
        let value = self.get_with("/api/orders/my", query).await?;
        take_page(value, "orders")
    }

    /// Every order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn admin_orders(&mut self, query: &OrderQuery) -> Result<Page<Order>, ApiError> {
        let value = self.get_with("/api/admin/orders", query).await?;
        take_page(value, "orders")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails (403 for other
    /// customers' orders).
    #[instrument(skip(self))]
    pub async fn order(&mut self, id: OrderId) -> Result<Order, ApiError> {
        let value = self.get(&format!("/api/orders/{id}")).await?;
        take(value, "order")
    }

    /// Create an order from an explicit item list.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order (e.g. insufficient stock).
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create_order(&mut self, input: &NewOrder) -> Result<Order, ApiError> {
        let value = self.post("/api/orders", input).await?;
        take(value, "order")
    }

    /// # Errors
    ///
    /// Returns an error if the order can no longer be cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_order(&mut self, id: OrderId) -> Result<Order, ApiError> {
        let value = self
            .post(&format!("/api/orders/{id}/cancel"), &json!({}))
            .await?;
        take(value, "order")
    }

    /// Request a status transition (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let value = self
            .patch(
                &format!("/api/admin/orders/{id}/status"),
                &json!({ "status": status.as_str() }),
            )
            .await?;
        take(value, "order")
    }

    /// # Errors
    ///
    /// Returns an error if the order is not delivered yet.
    #[instrument(skip(self))]
    pub async fn complete_order(&mut self, id: OrderId) -> Result<Order, ApiError> {
        let value = self
            .post(&format!("/api/admin/orders/{id}/complete"), &json!({}))
            .await?;
        take(value, "order")
    }
}
