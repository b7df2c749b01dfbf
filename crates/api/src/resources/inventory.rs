//! Stock levels, ledger and alerts.

use serde_json::json;
use tidewater_core::{AlertId, InventoryId};
use tracing::instrument;

use crate::client::{ApiSession, take, take_page};
use crate::error::ApiError;
use crate::types::{
    AlertQuery, Inventory, InventoryAlert, InventoryQuery, InventoryTransaction, NewInventory,
    Page, StockAdjustment, StockReceipt, TransactionQuery,
};

impl ApiSession<'_> {
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn inventories(&mut self, query: &InventoryQuery) -> Result<Page<Inventory>, ApiError> {
        let value = self.get_with("/api/inventories", query).await?;
        take_page(value, "inventories")
    }

    /// Create a stock record for a SKU that has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the SKU already has stock or does not exist.
    #[instrument(skip(self))]
    pub async fn create_inventory(&mut self, input: &NewInventory) -> Result<Inventory, ApiError> {
        let value = self.post("/api/inventories", input).await?;
        take(value, "inventory")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn inventory(&mut self, id: InventoryId) -> Result<Inventory, ApiError> {
        let value = self.get(&format!("/api/inventories/{id}")).await?;
        take(value, "inventory")
    }

    /// Apply a manual stock correction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the adjustment (e.g. it would
    /// drop stock below the allocated quantity).
    #[instrument(skip(self))]
    pub async fn adjust_stock(&mut self, input: &StockAdjustment) -> Result<Inventory, ApiError> {
        let value = self.post("/api/inventories/adjust", input).await?;
        take(value, "inventory")
    }

    /// Record inbound stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the receipt.
    #[instrument(skip(self))]
    pub async fn receive_stock(&mut self, input: &StockReceipt) -> Result<Inventory, ApiError> {
        let value = self.post("/api/inventories/receive", input).await?;
        take(value, "inventory")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the value.
    #[instrument(skip(self))]
    pub async fn update_safety_stock(
        &mut self,
        id: InventoryId,
        safety_stock: i64,
    ) -> Result<Inventory, ApiError> {
        let value = self
            .put(
                &format!("/api/inventories/{id}/safety-stock"),
                &json!({ "safety_stock": safety_stock }),
            )
            .await?;
        take(value, "inventory")
    }

    /// Stock ledger for one inventory record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn inventory_transactions(
        &mut self,
        id: InventoryId,
        query: &TransactionQuery,
    ) -> Result<Page<InventoryTransaction>, ApiError> {
        let value = self
            .get_with(&format!("/api/inventories/{id}/transactions"), query)
            .await?;
        take_page(value, "transactions")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn inventory_alerts(
        &mut self,
        query: &AlertQuery,
    ) -> Result<Page<InventoryAlert>, ApiError> {
        let value = self.get_with("/api/inventory-alerts", query).await?;
        take_page(value, "alerts")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn resolve_alert(&mut self, id: AlertId) -> Result<(), ApiError> {
        self.post(&format!("/api/inventory-alerts/{id}/resolve"), &json!({}))
            .await
            .map(|_| ())
    }
}
