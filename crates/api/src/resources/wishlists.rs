//! Wishlist ("favourites").

use serde::Serialize;
use tidewater_core::{ProductId, SkuId, WishlistId};
use tracing::instrument;

use crate::client::{ApiSession, take};
use crate::error::ApiError;
use crate::types::Wishlist;

#[derive(Debug, Serialize)]
struct WishlistKey {
    product_id: ProductId,
    product_sku_id: Option<SkuId>,
}

impl ApiSession<'_> {
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn wishlists(&mut self) -> Result<Vec<Wishlist>, ApiError> {
        let value = self.get("/api/wishlists").await?;
        take(value, "wishlists")
    }

    /// # Errors
    ///
    /// Returns an error if the product is already on the list.
    #[instrument(skip(self))]
    pub async fn add_to_wishlist(
        &mut self,
        product_id: ProductId,
        sku_id: Option<SkuId>,
    ) -> Result<Wishlist, ApiError> {
        let body = WishlistKey {
            product_id,
            product_sku_id: sku_id,
        };
        let value = self.post("/api/wishlists", &body).await?;
        take(value, "wishlist")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&mut self, id: WishlistId) -> Result<(), ApiError> {
        self.delete(&format!("/api/wishlists/{id}")).await.map(|_| ())
    }

    /// Whether the product (or SKU) is on the visitor's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn is_favorite(
        &mut self,
        product_id: ProductId,
        sku_id: Option<SkuId>,
    ) -> Result<bool, ApiError> {
        #[derive(Serialize)]
        struct Query {
            product_id: ProductId,
            #[serde(skip_serializing_if = "Option::is_none")]
            product_sku_id: Option<SkuId>,
        }
        let query = Query {
            product_id,
            product_sku_id: sku_id,
        };
        let value = self.get_with("/api/wishlists/check", &query).await?;
        take(value, "is_favorite")
    }
}
