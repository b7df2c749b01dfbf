//! Category management.

use tidewater_core::CategoryId;
use tracing::instrument;

use crate::client::{ApiSession, take};
use crate::error::ApiError;
use crate::types::{Category, CategoryInput};

impl ApiSession<'_> {
    /// Category tree (roots with nested `children`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn category_tree(&mut self) -> Result<Vec<Category>, ApiError> {
        let value = self.get("/api/categories").await?;
        take(value, "categories")
    }

    /// Every category, flat, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn all_categories(&mut self) -> Result<Vec<Category>, ApiError> {
        let value = self.get("/api/categories/all").await?;
        take(value, "categories")
    }

    /// Active categories (public endpoint).
    ///
    /// Prefer [`ApiClient::active_categories`](crate::ApiClient::active_categories),
    /// which caches this.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn public_categories(&mut self) -> Result<Vec<Category>, ApiError> {
        let value = self.get("/api/public/categories").await?;
        take(value, "categories")
    }

    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn category(&mut self, id: CategoryId) -> Result<Category, ApiError> {
        let value = self.get(&format!("/api/categories/{id}")).await?;
        take(value, "category")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the category (e.g. duplicate slug).
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_category(&mut self, input: &CategoryInput) -> Result<Category, ApiError> {
        let value = self.post("/api/categories", input).await?;
        take(value, "category")
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &mut self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let value = self.put(&format!("/api/categories/{id}"), input).await?;
        take(value, "category")
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses (e.g. the category has products).
    #[instrument(skip(self))]
    pub async fn delete_category(&mut self, id: CategoryId) -> Result<(), ApiError> {
        self.delete(&format!("/api/categories/{id}")).await.map(|_| ())
    }
}
