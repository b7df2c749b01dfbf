//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Backend reachability
//!
//! # Catalog
//! GET  /products               - Product listing (search, category, price, sort)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (HTMX fragments or redirects)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (message fragment, triggers cart-updated)
//! POST /cart/update            - Update quantity (cart_items fragment)
//! POST /cart/remove            - Remove item (cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Address and payment method selection
//! POST /checkout               - Place order
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/cancel     - Cancel a pending/confirmed order
//!
//! # Addresses (requires auth)
//! GET  /addresses              - Address book
//! GET  /addresses/new          - New address form
//! POST /addresses              - Create
//! GET  /addresses/{id}/edit    - Edit form
//! POST /addresses/{id}         - Update
//! POST /addresses/{id}/delete  - Delete
//! POST /addresses/{id}/default - Make default
//!
//! # Wishlist (requires auth)
//! GET  /wishlists              - Saved products
//! POST /wishlists              - Save a product
//! POST /wishlists/{id}/delete  - Remove
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! GET  /register               - Register page
//! POST /register               - Register action (rate limited)
//! POST /logout                 - Logout action
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod wishlists;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Whether the request was issued by HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Create the auth routes router.
///
/// Credential posts share a stricter per-client limit.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route("/new", get(addresses::new))
        .route("/{id}", post(addresses::update))
        .route("/{id}/edit", get(addresses::edit))
        .route("/{id}/delete", post(addresses::delete))
        .route("/{id}/default", post(addresses::make_default))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlists::index).post(wishlists::add))
        .route("/{id}/delete", post(wishlists::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place))
        .nest("/orders", order_routes())
        .nest("/addresses", address_routes())
        .nest("/wishlists", wishlist_routes())
        .merge(auth_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", "true".parse().unwrap_or_else(|_| unreachable!()));
        assert!(is_htmx(&headers));
    }
}
