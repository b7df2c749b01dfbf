//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Health check
//! GET  /health/ready                         - Backend reachability
//!
//! # Dashboard
//! GET  /                                     - Unresolved alerts, recent orders
//!
//! # Auth (backend admin accounts)
//! GET  /login                                - Login page
//! POST /login                                - Login action (rate limited)
//! POST /logout                               - Logout
//!
//! # Products
//! GET  /products                             - Listing (search, page, trashed=1)
//! GET  /products/new                         - New product form (with first SKU)
//! POST /products                             - Create
//! GET  /products/{id}/edit                   - Edit form
//! POST /products/{id}                        - Update
//! POST /products/{id}/delete                 - Soft delete
//! POST /products/{id}/restore                - Restore from trash
//! GET  /products/{id}/skus                   - SKU list + add form
//! POST /products/{id}/skus                   - Add SKU
//! POST /products/{id}/skus/{sku}             - Update SKU
//! POST /products/{id}/skus/{sku}/delete      - Delete SKU
//! GET  /products/{id}/images                 - Image list + upload form
//! POST /products/{id}/images                 - Upload (multipart) and attach
//! POST /products/{id}/images/{image}         - Update alt text / order
//! POST /products/{id}/images/{image}/primary - Make primary
//! POST /products/{id}/images/{image}/delete  - Detach and delete file
//!
//! # Categories
//! GET  /categories                           - Tree
//! GET  /categories/new, POST /categories     - Create
//! GET  /categories/{id}/edit                 - Edit form
//! POST /categories/{id}                      - Update
//! POST /categories/{id}/delete               - Delete
//!
//! # Inventory
//! GET  /inventories                          - Stock list (status, sku_code, page)
//! GET  /inventories/new, POST /inventories   - Create a stock record for a SKU
//! GET  /inventories/{id}                     - Detail with transactions
//! GET  /inventories/{id}/adjust              - Adjust/receive form
//! POST /inventories/{id}/adjust              - Signed adjustment
//! POST /inventories/{id}/receive             - Inbound receipt
//! GET  /inventories/{id}/safety-stock        - Safety stock form
//! POST /inventories/{id}/safety-stock        - Update safety stock
//! GET  /inventories/alerts                   - Alerts (unresolved, alert_type)
//! POST /inventories/alerts/{id}/resolve      - Resolve alert
//!
//! # Orders
//! GET  /orders                               - Listing (status, number, dates, page)
//! GET  /orders/new, POST /orders             - Create on behalf of a customer
//! GET  /orders/{id}                          - Detail
//! POST /orders/{id}/status                   - Set status
//! POST /orders/{id}/cancel                   - Cancel
//! POST /orders/{id}/complete                 - Complete
//! POST /orders/{id}/shipments                - Create a (partial) shipment
//!
//! # Shipments
//! GET  /shipments                            - Listing (status, numbers, page)
//! GET  /shipments/{id}                       - Detail
//! POST /shipments/items/{item}/pick          - Pick one item
//! POST /shipments/{id}/pick-all              - Pick every item
//! POST /shipments/{id}/pack                  - Mark packed
//! POST /shipments/{id}/ship                  - Ship with carrier and tracking
//! POST /shipments/{id}/deliver               - Mark delivered
//! POST /shipments/{id}/tracking              - Update carrier/tracking
//! POST /shipments/{id}/note                  - Update note
//! ```

pub mod alerts;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod images;
pub mod inventories;
pub mod orders;
pub mod products;
pub mod shipments;
pub mod skus;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tidewater_api::ApiError;

use crate::error::Result;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, login_rate_limiter};
use crate::state::AppState;

/// Store a flash message and redirect.
pub(crate) async fn redirect_with(backend: &Backend, flash: Flash, to: &str) -> Result<Response> {
    set_flash(backend.session(), flash).await?;
    Ok(Redirect::to(to).into_response())
}

/// Messages to show above a form after the backend rejected it.
pub(crate) fn form_errors(err: &ApiError, fallback: &str) -> Vec<String> {
    let messages = err.field_messages();
    if messages.is_empty() {
        vec![err.user_message(fallback)]
    } else {
        messages
    }
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse an optional numeric field, recording a message when it is malformed.
pub(crate) fn parse_optional<T: std::str::FromStr>(
    raw: &str,
    label: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<T>().map_or_else(
        |_| {
            errors.push(format!("{label} must be a number"));
            None
        },
        Some,
    )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).post(auth::login).layer(login_rate_limiter()),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router, including SKUs and images.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/restore", post(products::restore))
        .route("/{id}/skus", get(skus::index).post(skus::create))
        .route("/{id}/skus/{sku}", post(skus::update))
        .route("/{id}/skus/{sku}/delete", post(skus::delete))
        .route(
            "/{id}/images",
            get(images::index)
                .post(images::upload)
                .layer(DefaultBodyLimit::max(images::MAX_UPLOAD_BYTES)),
        )
        .route("/{id}/images/{image}", post(images::update))
        .route("/{id}/images/{image}/primary", post(images::make_primary))
        .route("/{id}/images/{image}/delete", post(images::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventories::index).post(inventories::create))
        .route("/new", get(inventories::new))
        .route("/alerts", get(alerts::index))
        .route("/alerts/{id}/resolve", post(alerts::resolve))
        .route("/{id}", get(inventories::show))
        .route(
            "/{id}/adjust",
            get(inventories::adjust_page).post(inventories::adjust),
        )
        .route("/{id}/receive", post(inventories::receive))
        .route(
            "/{id}/safety-stock",
            get(inventories::safety_stock_page).post(inventories::update_safety_stock),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/new", get(orders::new))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/complete", post(orders::complete))
        .route("/{id}/shipments", post(orders::create_shipment))
}

/// Create the shipment routes router.
pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::index))
        .route("/items/{item}/pick", post(shipments::pick_item))
        .route("/{id}", get(shipments::show))
        .route("/{id}/pick-all", post(shipments::pick_all))
        .route("/{id}/pack", post(shipments::pack))
        .route("/{id}/ship", post(shipments::ship))
        .route("/{id}/deliver", post(shipments::deliver))
        .route("/{id}/tracking", post(shipments::update_tracking))
        .route("/{id}/note", post(shipments::update_note))
}

/// Create all routes for the admin console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/inventories", inventory_routes())
        .nest("/orders", order_routes())
        .nest("/shipments", shipment_routes())
        .merge(auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_form_errors_prefers_field_messages() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"The given data was invalid.","errors":{"slug":["The slug has already been taken."]}}"#,
        );
        assert_eq!(
            form_errors(&err, "Could not save"),
            vec!["The slug has already been taken.".to_string()]
        );

        let err = ApiError::from_response(StatusCode::CONFLICT, r#"{"error":"Category has products"}"#);
        assert_eq!(
            form_errors(&err, "Could not save"),
            vec!["Category has products".to_string()]
        );
    }

    #[test]
    fn test_parse_optional() {
        let mut errors = Vec::new();
        assert_eq!(parse_optional::<i64>(" 12 ", "Quantity", &mut errors), Some(12));
        assert_eq!(parse_optional::<i64>("", "Quantity", &mut errors), None);
        assert!(errors.is_empty());
        assert_eq!(parse_optional::<i64>("a dozen", "Quantity", &mut errors), None);
        assert_eq!(errors, vec!["Quantity must be a number".to_string()]);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Navy "), Some("Navy".to_string()));
    }
}
