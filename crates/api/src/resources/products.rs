//! Products, SKUs and product images.

use serde_json::json;
use tidewater_core::{ImageId, ProductId, SkuId};
use tracing::instrument;

use crate::client::{ApiSession, take, take_page};
use crate::error::ApiError;
use crate::types::{
    ImageInput, Page, Product, ProductImage, ProductInput, ProductQuery, ProductSku, SkuInput,
};

impl ApiSession<'_> {
    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn products(&mut self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let value = self.get_with("/api/products", query).await?;
        take_page(value, "products")
    }

    /// Soft-deleted products (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn trashed_products(
        &mut self,
        query: &ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        let value = self.get_with("/api/admin/products/trashed", query).await?;
        take_page(value, "products")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails (404 for unknown IDs).
    #[instrument(skip(self))]
    pub async fn product(&mut self, id: ProductId) -> Result<Product, ApiError> {
        let value = self.get(&format!("/api/products/{id}")).await?;
        take(value, "product")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, input), fields(product_code = %input.product_code))]
    pub async fn create_product(&mut self, input: &ProductInput) -> Result<Product, ApiError> {
        let value = self.post("/api/products", input).await?;
        take(value, "product")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &mut self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let value = self.put(&format!("/api/products/{id}"), input).await?;
        take(value, "product")
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/api/products/{id}")).await.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn restore_product(&mut self, id: ProductId) -> Result<Product, ApiError> {
        let value = self
            .post(&format!("/api/products/{id}/restore"), &json!({}))
            .await?;
        take(value, "product")
    }

    /// Add one or more SKUs to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects any SKU.
    #[instrument(skip(self, skus), fields(count = skus.len()))]
    pub async fn add_skus(
        &mut self,
        product_id: ProductId,
        skus: &[SkuInput],
    ) -> Result<Vec<ProductSku>, ApiError> {
        let value = self
            .post(
                &format!("/api/products/{product_id}/skus"),
                &json!({ "skus": skus }),
            )
            .await?;
        take(value, "skus")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_sku(
        &mut self,
        product_id: ProductId,
        sku_id: SkuId,
        input: &SkuInput,
    ) -> Result<ProductSku, ApiError> {
        let value = self
            .put(&format!("/api/products/{product_id}/skus/{sku_id}"), input)
            .await?;
        take(value, "sku")
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses (e.g. the SKU has orders).
    #[instrument(skip(self))]
    pub async fn delete_sku(&mut self, product_id: ProductId, sku_id: SkuId) -> Result<(), ApiError> {
        self.delete(&format!("/api/products/{product_id}/skus/{sku_id}"))
            .await
            .map(|_| ())
    }

    /// Attach already-uploaded images to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the images.
    #[instrument(skip(self, images), fields(count = images.len()))]
    pub async fn add_product_images(
        &mut self,
        product_id: ProductId,
        images: &[ImageInput],
    ) -> Result<Vec<ProductImage>, ApiError> {
        let value = self
            .post(
                &format!("/api/products/{product_id}/images"),
                &json!({ "images": images }),
            )
            .await?;
        take(value, "images")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_product_image(
        &mut self,
        product_id: ProductId,
        image_id: ImageId,
        input: &ImageInput,
    ) -> Result<ProductImage, ApiError> {
        let value = self
            .put(
                &format!("/api/products/{product_id}/images/{image_id}"),
                input,
            )
            .await?;
        take(value, "image")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn delete_product_image(
        &mut self,
        product_id: ProductId,
        image_id: ImageId,
    ) -> Result<(), ApiError> {
        self.delete(&format!("/api/products/{product_id}/images/{image_id}"))
            .await
            .map(|_| ())
    }
}
