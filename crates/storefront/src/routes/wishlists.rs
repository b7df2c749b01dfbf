//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tidewater_api::Wishlist;
use tidewater_core::{ProductId, SkuId, WishlistId, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, RequireAuth};
use crate::views::{AssetUrls, PageContext, ProductCard};

/// Add to wishlist form data.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistForm {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub product_sku_id: Option<SkuId>,
}

/// One saved product.
#[derive(Clone)]
pub struct WishlistEntry {
    pub id: String,
    pub product_id: String,
    pub card: Option<ProductCard>,
    pub variant: Option<String>,
}

impl WishlistEntry {
    fn new(item: &Wishlist, assets: &AssetUrls) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            card: item.product.as_ref().map(|p| ProductCard::new(p, assets)),
            variant: item
                .product_sku
                .as_ref()
                .map(tidewater_api::ProductSku::variant_label)
                .filter(|label| !label.is_empty()),
        }
    }
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlists/index.html")]
pub struct WishlistsTemplate {
    pub page: PageContext,
    pub entries: Vec<WishlistEntry>,
}

/// List saved products.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let result = backend.api().wishlists().await;
    backend.save().await?;
    let items = result?;

    let assets = AssetUrls::new(backend.client().clone());
    Ok(WishlistsTemplate {
        page,
        entries: items.iter().map(|w| WishlistEntry::new(w, &assets)).collect(),
    })
}

/// Save a product, then return to its page.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %form.product_id))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Form(form): Form<AddToWishlistForm>,
) -> Result<Response> {
    let result = backend
        .api()
        .add_to_wishlist(form.product_id, form.product_sku_id)
        .await;
    backend.save().await?;

    let flash = match result {
        Ok(_) => Flash::notice("Saved to your wishlist"),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => Flash::error(e.user_message("Could not save to your wishlist")),
    };
    set_flash(backend.session(), flash).await?;
    Ok(Redirect::to(&format!("/products/{}", form.product_id)).into_response())
}

/// Remove a wishlist entry.
#[instrument(skip_all, fields(user_id = %user.id, wishlist_id = %id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Path(id): Path<WishlistId>,
) -> Result<Response> {
    let result = backend.api().remove_from_wishlist(id).await;
    backend.save().await?;

    let flash = match result {
        Ok(()) => Flash::notice("Removed from your wishlist"),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => Flash::error(e.user_message("Could not remove the item")),
    };
    set_flash(backend.session(), flash).await?;
    Ok(Redirect::to("/wishlists").into_response())
}
