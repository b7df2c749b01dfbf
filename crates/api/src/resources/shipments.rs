//! Shipment fulfilment (admin).

use serde_json::json;
use tidewater_core::{ShipmentId, ShipmentItemId};
use tracing::instrument;

use crate::client::{ApiSession, take, take_page};
use crate::error::ApiError;
use crate::types::{Choice, NewShipment, Page, Shipment, ShipmentItem, ShipmentQuery, TrackingInfo};

impl ApiSession<'_> {
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn shipment_statuses(&mut self) -> Result<Vec<Choice>, ApiError> {
        let value = self.get("/api/shipments/statuses").await?;
        take(value, "statuses")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn shipments(&mut self, query: &ShipmentQuery) -> Result<Page<Shipment>, ApiError> {
        let value = self.get_with("/api/admin/shipments", query).await?;
        take_page(value, "shipments")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn shipment(&mut self, id: ShipmentId) -> Result<Shipment, ApiError> {
        let value = self.get(&format!("/api/admin/shipments/{id}")).await?;
        take(value, "shipment")
    }

    /// Create an additional (partial) shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if a quantity exceeds what is left to ship.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn create_shipment(&mut self, input: &NewShipment) -> Result<Shipment, ApiError> {
        let value = self.post("/api/admin/shipments", input).await?;
        take(value, "shipment")
    }

    /// Mark one shipment line as picked.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self))]
    pub async fn pick_item(&mut self, item_id: ShipmentItemId) -> Result<ShipmentItem, ApiError> {
        let value = self
            .post(&format!("/api/admin/shipments/items/{item_id}/pick"), &json!({}))
            .await?;
        take(value, "shipment_item")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self))]
    pub async fn pick_all(&mut self, id: ShipmentId) -> Result<Shipment, ApiError> {
        self.shipment_action(id, "pick-all").await
    }

    /// # Errors
    ///
    /// Returns an error if items are still unpicked.
    #[instrument(skip(self))]
    pub async fn pack_shipment(&mut self, id: ShipmentId) -> Result<Shipment, ApiError> {
        self.shipment_action(id, "pack").await
    }

    /// Hand the shipment to the carrier.
    ///
    /// # Errors
    ///
    /// Returns an error if the shipment is not packed.
    #[instrument(skip(self))]
    pub async fn ship_shipment(
        &mut self,
        id: ShipmentId,
        tracking: &TrackingInfo,
    ) -> Result<Shipment, ApiError> {
        let value = self
            .post(&format!("/api/admin/shipments/{id}/ship"), tracking)
            .await?;
        take(value, "shipment")
    }

    /// # Errors
    ///
    /// Returns an error if the shipment has not shipped.
    #[instrument(skip(self))]
    pub async fn deliver_shipment(&mut self, id: ShipmentId) -> Result<Shipment, ApiError> {
        self.shipment_action(id, "deliver").await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self))]
    pub async fn update_tracking(
        &mut self,
        id: ShipmentId,
        tracking: &TrackingInfo,
    ) -> Result<Shipment, ApiError> {
        let value = self
            .patch(&format!("/api/admin/shipments/{id}/tracking"), tracking)
            .await?;
        take(value, "shipment")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, note))]
    pub async fn update_shipment_note(
        &mut self,
        id: ShipmentId,
        note: &str,
    ) -> Result<Shipment, ApiError> {
        let value = self
            .patch(
                &format!("/api/admin/shipments/{id}/note"),
                &json!({ "note": note }),
            )
            .await?;
        take(value, "shipment")
    }

    async fn shipment_action(&mut self, id: ShipmentId, action: &str) -> Result<Shipment, ApiError> {
        let value = self
            .post(&format!("/api/admin/shipments/{id}/{action}"), &json!({}))
            .await?;
        take(value, "shipment")
    }
}
