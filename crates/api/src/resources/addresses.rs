//! Saved delivery addresses.

use serde_json::json;
use tidewater_core::AddressId;
use tracing::instrument;

use crate::client::{ApiSession, take};
use crate::error::ApiError;
use crate::types::{Address, AddressInput};

impl ApiSession<'_> {
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&mut self) -> Result<Vec<Address>, ApiError> {
        let value = self.get("/api/addresses").await?;
        take(value, "addresses")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn address(&mut self, id: AddressId) -> Result<Address, ApiError> {
        let value = self.get(&format!("/api/addresses/{id}")).await?;
        take(value, "address")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, input))]
    pub async fn create_address(&mut self, input: &AddressInput) -> Result<Address, ApiError> {
        let value = self.post("/api/addresses", input).await?;
        take(value, "address")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_address(
        &mut self,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, ApiError> {
        let value = self.put(&format!("/api/addresses/{id}"), input).await?;
        take(value, "address")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&mut self, id: AddressId) -> Result<(), ApiError> {
        self.delete(&format!("/api/addresses/{id}")).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn set_default_address(&mut self, id: AddressId) -> Result<Address, ApiError> {
        let value = self
            .put(&format!("/api/addresses/{id}/default"), &json!({}))
            .await?;
        take(value, "address")
    }
}
