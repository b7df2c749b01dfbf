//! Cart route handlers.
//!
//! The cart lives in the backend and needs a signed-in customer. Every
//! handler goes through the session's [`CartMirror`], which keeps the last
//! good cart when a call fails. HTMX requests get fragments back plus a
//! `cart-updated` trigger for the header badge; plain form posts get a
//! redirect with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::{HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tidewater_api::ApiError;
use tidewater_core::{ProductId, SkuId};
use tracing::instrument;

use crate::cart::CartMirror;
use crate::error::{BackendSessionExpired, Result, add_breadcrumb};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, OptionalAuth, RequireAuth};
use crate::routes::is_htmx;
use crate::views::{AssetUrls, PageContext};

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_sku_id: SkuId,
    pub quantity: Option<u32>,
    /// Product page to return to after a non-HTMX post.
    pub product_id: Option<ProductId>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_sku_id: SkuId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_sku_id: SkuId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub mirror: CartMirror,
    pub assets: AssetUrls,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub mirror: CartMirror,
    pub assets: AssetUrls,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline result of an add-to-cart (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_message.html")]
pub struct CartMessageTemplate {
    pub message: String,
    pub is_error: bool,
}

/// Display the cart page, refreshing the mirror first.
///
/// If the refresh fails the last known cart is shown with the error.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    let mut mirror = CartMirror::load(backend.session()).await;
    let result = mirror.fetch(&mut backend.api()).await;
    backend.save().await?;
    mirror.save(backend.session()).await?;

    if let Err(e) = result
        && e.is_unauthenticated()
    {
        return Err(e.into());
    }

    Ok(CartShowTemplate {
        page,
        mirror,
        assets: AssetUrls::new(backend.client().clone()),
    }
    .into_response())
}

/// Add a SKU to the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1).max(1);
    let sku_id = form.product_sku_id.to_string();
    add_breadcrumb("cart", "Add to cart", Some(&[("sku_id", sku_id.as_str())][..]));

    let mut mirror = CartMirror::load(backend.session()).await;
    let result = mirror
        .add(&mut backend.api(), form.product_sku_id, quantity)
        .await;
    persist(&backend, &mirror).await?;

    let htmx = is_htmx(&headers);
    if htmx {
        return Ok(match result {
            Ok(()) => (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartMessageTemplate {
                    message: "Added to your cart".to_string(),
                    is_error: false,
                },
            )
                .into_response(),
            Err(e) if e.is_unauthenticated() => htmx_login_redirect(),
            Err(_) => CartMessageTemplate {
                message: mirror.error.unwrap_or_default(),
                is_error: true,
            }
            .into_response(),
        });
    }

    let back = form
        .product_id
        .map_or_else(|| "/cart".to_string(), |id| format!("/products/{id}"));
    finish_form_post(&backend, &mirror, result, "Added to your cart", &back).await
}

/// Update a line's quantity. Zero removes the line.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut mirror = CartMirror::load(backend.session()).await;
    let result = if form.quantity == 0 {
        mirror.remove(&mut backend.api(), form.product_sku_id).await
    } else {
        mirror
            .update(&mut backend.api(), form.product_sku_id, form.quantity)
            .await
    };
    persist(&backend, &mirror).await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&backend, mirror, result));
    }
    finish_form_post(&backend, &mirror, result, "Cart updated", "/cart").await
}

/// Remove a line.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut mirror = CartMirror::load(backend.session()).await;
    let result = mirror.remove(&mut backend.api(), form.product_sku_id).await;
    persist(&backend, &mirror).await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&backend, mirror, result));
    }
    finish_form_post(&backend, &mirror, result, "Item removed", "/cart").await
}

/// Empty the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    headers: HeaderMap,
) -> Result<Response> {
    let mut mirror = CartMirror::load(backend.session()).await;
    let result = mirror.clear(&mut backend.api()).await;
    persist(&backend, &mirror).await?;

    if is_htmx(&headers) {
        return Ok(items_fragment(&backend, mirror, result));
    }
    finish_form_post(&backend, &mirror, result, "Your cart is now empty", "/cart").await
}

/// Get cart count badge (HTMX). Zero for guests.
///
/// A failed refresh shows the last known count.
#[instrument(skip_all)]
pub async fn count(auth: OptionalAuth, mut backend: Backend) -> Result<Response> {
    if auth.0.is_none() {
        return Ok(CartCountTemplate { count: 0 }.into_response());
    }

    let mut mirror = CartMirror::load(backend.session()).await;
    let result = mirror.fetch_count(&mut backend.api()).await;
    persist(&backend, &mirror).await?;

    match result {
        Ok(count) => Ok(CartCountTemplate { count }.into_response()),
        Err(e) if e.is_unauthenticated() => {
            let mut response = CartCountTemplate { count: 0 }.into_response();
            response.extensions_mut().insert(BackendSessionExpired);
            Ok(response)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh cart count");
            Ok(CartCountTemplate {
                count: mirror.count,
            }
            .into_response())
        }
    }
}

async fn persist(backend: &Backend, mirror: &CartMirror) -> Result<()> {
    backend.save().await?;
    mirror.save(backend.session()).await?;
    Ok(())
}

/// Items fragment after an HTMX mutation. The error, if any, is rendered
/// inside the fragment from the mirror.
fn items_fragment(backend: &Backend, mirror: CartMirror, result: std::result::Result<(), ApiError>) -> Response {
    let fragment = CartItemsTemplate {
        mirror,
        assets: AssetUrls::new(backend.client().clone()),
    };
    match result {
        Ok(()) => (AppendHeaders([("HX-Trigger", "cart-updated")]), fragment).into_response(),
        Err(e) if e.is_unauthenticated() => htmx_login_redirect(),
        Err(_) => fragment.into_response(),
    }
}

/// Tell HTMX to leave the page for the login form.
fn htmx_login_redirect() -> Response {
    let mut response = ().into_response();
    response
        .headers_mut()
        .insert("HX-Redirect", HeaderValue::from_static("/login"));
    response.extensions_mut().insert(BackendSessionExpired);
    response
}

async fn finish_form_post(
    backend: &Backend,
    mirror: &CartMirror,
    result: std::result::Result<(), ApiError>,
    notice: &str,
    back: &str,
) -> Result<Response> {
    match result {
        Ok(()) => set_flash(backend.session(), Flash::notice(notice)).await?,
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(_) => {
            let message = mirror.error.clone().unwrap_or_default();
            set_flash(backend.session(), Flash::error(message)).await?;
        }
    }
    Ok(Redirect::to(back).into_response())
}
