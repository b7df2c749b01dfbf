//! Storefront router end to end against the fake backend.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use tidewater_integration_tests::{Browser, Canned, FakeBackend, XSRF_HEADER_VALUE, user_json};
use tidewater_storefront::config::StorefrontConfig;
use tidewater_storefront::middleware::session::SESSION_COOKIE_NAME;
use tidewater_storefront::state::AppState;

fn browser(backend: &FakeBackend) -> Browser {
    let config = StorefrontConfig::from_lookup(backend.storefront_env()).expect("config");
    let state = AppState::new(config).expect("state");
    Browser::new(tidewater_storefront::app(state), SESSION_COOKIE_NAME)
}

fn cart_json(quantity: u32) -> Value {
    json!({
        "items": [{
            "product_sku_id": 11,
            "quantity": quantity,
            "product": { "id": 3, "name": "Linen Tee", "product_code": "TEE-01", "tax_rate": "10" },
            "sku": { "id": 11, "sku_code": "TEE-01-M", "price": "3300", "size": "M" },
            "available_quantity": 1
        }],
        "totals": {
            "subtotal": "6600",
            "shipping_fee": "0",
            "total_price": "6600",
            "item_count": quantity
        }
    })
}

async fn logged_in(backend: &FakeBackend) -> Browser {
    backend.on(
        Method::POST,
        "/api/login",
        Canned::ok(json!({ "user": user_json(7, "Hana", "hana@example.com", "customer") })),
    );
    let mut browser = browser(backend);
    let page = browser
        .post_form("/login", &[("email", "hana@example.com"), ("password", "secret")])
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/"));
    assert!(browser.has_session());
    browser
}

#[tokio::test]
async fn test_health_and_readiness() {
    let backend = FakeBackend::start().await;
    let mut browser = browser(&backend);

    assert_eq!(browser.get("/health").await.body, "ok");
    assert_eq!(browser.get("/health/ready").await.status, StatusCode::OK);

    backend.set(
        Method::GET,
        "/sanctum/csrf-cookie",
        Canned::json(StatusCode::BAD_GATEWAY, Value::Null),
    );
    assert_eq!(
        browser.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_security_headers_allow_backend_images() {
    let backend = FakeBackend::start().await;
    let page = browser(&backend).get("/login").await;

    assert_eq!(page.status, StatusCode::OK);
    let csp = page.headers["content-security-policy"].to_str().expect("csp");
    assert!(csp.contains(&backend.url()));
    assert_eq!(page.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_failed_login_shows_backend_message() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::POST,
        "/api/login",
        Canned::unprocessable("These credentials do not match our records."),
    );
    let page = browser(&backend)
        .post_form("/login", &[("email", "hana@example.com"), ("password", "wrong")])
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("These credentials do not match our records."));
}

#[tokio::test]
async fn test_cart_requires_login() {
    let backend = FakeBackend::start().await;
    let page = browser(&backend).get("/cart").await;

    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/login"));
    assert!(backend.requests_to(&Method::GET, "/api/cart").is_empty());
}

#[tokio::test]
async fn test_failed_cart_add_keeps_previous_cart() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;
    backend.on(Method::POST, "/api/cart/add", Canned::ok(cart_json(2)));
    backend.on(
        Method::POST,
        "/api/cart/add",
        Canned::unprocessable("Only 1 left in stock."),
    );

    let page = browser
        .post_form("/cart/add", &[("product_sku_id", "11"), ("quantity", "2"), ("product_id", "3")])
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/products/3"));

    let add = backend.last(&Method::POST, "/api/cart/add");
    assert_eq!(add.json(), json!({ "product_sku_id": 11, "quantity": 2 }));
    assert_eq!(add.header("x-xsrf-token"), Some(XSRF_HEADER_VALUE));

    let page = browser
        .post_form("/cart/add", &[("product_sku_id", "11"), ("quantity", "5")])
        .await;
    assert_eq!(page.location(), Some("/cart"));

    // The backend cannot be reached now; the page falls back to the mirror.
    backend.on(
        Method::GET,
        "/api/cart",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" })),
    );
    let page = browser.get("/cart").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Only 1 left in stock."));
    assert!(page.body.contains("Linen Tee"));

    backend.on(
        Method::GET,
        "/api/cart/count",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" })),
    );
    let page = browser.get("/cart/count").await;
    assert!(page.body.contains(">2<"));
}

#[tokio::test]
async fn test_htmx_cart_add_returns_fragment_and_trigger() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;
    backend.on(Method::POST, "/api/cart/add", Canned::ok(cart_json(1)));

    let request = axum::http::Request::post("/cart/add")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("hx-request", "true")
        .body(axum::body::Body::from("product_sku_id=11"))
        .expect("request");
    let page = browser.send(request).await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.headers["hx-trigger"], "cart-updated");
    assert!(page.body.contains("Added to your cart"));
    assert_eq!(
        backend.last(&Method::POST, "/api/cart/add").json()["quantity"],
        1
    );
}

#[tokio::test]
async fn test_new_address_is_posted_and_redirects() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;
    backend.on(
        Method::POST,
        "/api/addresses",
        Canned::json(
            StatusCode::CREATED,
            json!({ "address": {
                "id": 5, "user_id": 7, "recipient_name": "Hana Sato", "postal_code": "150-0001",
                "prefecture": "Tokyo", "city": "Shibuya", "address_line1": "1-2-3",
                "phone": "0312345678", "address_type": "home", "is_default": true
            } }),
        ),
    );

    let page = browser
        .post_form(
            "/addresses",
            &[
                ("recipient_name", " Hana Sato "),
                ("postal_code", "150-0001"),
                ("prefecture", "Tokyo"),
                ("city", "Shibuya"),
                ("address_line1", "1-2-3"),
                ("address_line2", ""),
                ("phone", "0312345678"),
                ("address_type", "home"),
                ("is_default", "on"),
            ],
        )
        .await;

    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/addresses"));

    let sent = backend.last(&Method::POST, "/api/addresses").json();
    assert_eq!(sent["recipient_name"], "Hana Sato");
    assert_eq!(sent["address_type"], "home");
    assert_eq!(sent["is_default"], true);
    assert!(sent.get("address_line2").is_none());
}

#[tokio::test]
async fn test_incomplete_address_is_not_sent() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;

    let page = browser
        .post_form("/addresses", &[("recipient_name", "Hana Sato")])
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Postal code is required"));
    assert!(page.body.contains("Phone is required"));
    assert!(backend.requests_to(&Method::POST, "/api/addresses").is_empty());
}

#[tokio::test]
async fn test_expired_backend_session_logs_visitor_out() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;
    backend.on(Method::GET, "/api/cart", Canned::unauthenticated());

    let page = browser.get("/cart").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/login"));

    let page = browser.get("/login").await;
    assert!(page.body.contains("Your session has expired. Please log in again."));

    // Local login state is gone: the next visit is stopped before the backend.
    let page = browser.get("/cart").await;
    assert_eq!(page.location(), Some("/login"));
    assert_eq!(backend.requests_to(&Method::GET, "/api/cart").len(), 1);
}

#[tokio::test]
async fn test_logout_ends_backend_session() {
    let backend = FakeBackend::start().await;
    let mut browser = logged_in(&backend).await;
    backend.on(Method::POST, "/api/logout", Canned::ok(json!({ "message": "Logged out" })));

    let page = browser.post_form("/logout", &[]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(backend.requests_to(&Method::POST, "/api/logout").len(), 1);

    let page = browser.get("/orders").await;
    assert_eq!(page.location(), Some("/login"));
}

async fn with_cart(backend: &FakeBackend) -> Browser {
    let mut browser = logged_in(backend).await;
    backend.on(Method::POST, "/api/cart/add", Canned::ok(cart_json(2)));
    let page = browser
        .post_form("/cart/add", &[("product_sku_id", "11"), ("quantity", "2")])
        .await;
    assert_eq!(page.location(), Some("/cart"));
    browser
}

fn empty_cart_json() -> Value {
    json!({
        "items": [],
        "totals": { "subtotal": "0", "shipping_fee": "0", "total_price": "0", "item_count": 0 }
    })
}

#[tokio::test]
async fn test_relogin_drops_previous_users_cart() {
    let backend = FakeBackend::start().await;
    let mut browser = with_cart(&backend).await;

    backend.set(
        Method::POST,
        "/api/login",
        Canned::ok(json!({ "user": user_json(8, "Ren", "ren@example.com", "customer") })),
    );
    let page = browser
        .post_form("/login", &[("email", "ren@example.com"), ("password", "secret")])
        .await;
    assert_eq!(page.location(), Some("/"));

    backend.on(
        Method::GET,
        "/api/cart",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" })),
    );
    let page = browser.get("/cart").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(!page.body.contains("Linen Tee"));

    let page = browser.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(page.location(), Some("/cart"));
    assert!(backend.requests_to(&Method::POST, "/api/cart/checkout").is_empty());
}

#[tokio::test]
async fn test_checkout_places_order_once() {
    let backend = FakeBackend::start().await;
    let mut browser = with_cart(&backend).await;
    backend.on(
        Method::POST,
        "/api/cart/checkout",
        Canned::json(
            StatusCode::CREATED,
            json!({ "order": { "id": 42, "order_number": "TW-20261019-0042", "status": "pending" } }),
        ),
    );

    let page = browser.post_form("/checkout", &[("address_id", "")]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/checkout"));
    assert!(backend.requests_to(&Method::POST, "/api/cart/checkout").is_empty());

    let page = browser.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(page.location(), Some("/orders/42"));
    assert_eq!(
        backend.last(&Method::POST, "/api/cart/checkout").json(),
        json!({ "address_id": 5, "payment_method": "credit_card", "note": null })
    );

    // The mirror was emptied with the backend cart.
    let page = browser.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(page.location(), Some("/cart"));
    assert_eq!(backend.requests_to(&Method::POST, "/api/cart/checkout").len(), 1);

    backend.on(Method::GET, "/api/cart", Canned::ok(empty_cart_json()));
    let page = browser.get("/cart").await;
    assert!(page.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart_and_flashes_reason() {
    let backend = FakeBackend::start().await;
    let mut browser = with_cart(&backend).await;
    backend.on(
        Method::POST,
        "/api/cart/checkout",
        Canned::json(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "message": "Checkout failed", "error": "Linen Tee is out of stock" }),
        ),
    );

    let page = browser
        .post_form(
            "/checkout",
            &[("address_id", "5"), ("payment_method", "bank_transfer"), ("note", "Leave at door")],
        )
        .await;
    assert_eq!(page.location(), Some("/checkout"));

    let sent = backend.last(&Method::POST, "/api/cart/checkout").json();
    assert_eq!(sent["payment_method"], "bank_transfer");
    assert_eq!(sent["note"], "Leave at door");

    backend.on(
        Method::GET,
        "/api/cart",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" })),
    );
    let page = browser.get("/cart").await;
    assert!(page.body.contains("Linen Tee is out of stock"));
    assert!(page.body.contains("Linen Tee"));
}

#[tokio::test]
async fn test_checkout_with_unreadable_order_lands_on_order_list() {
    let backend = FakeBackend::start().await;
    let mut browser = with_cart(&backend).await;
    backend.on(
        Method::POST,
        "/api/cart/checkout",
        Canned::json(StatusCode::CREATED, json!({ "message": "Order placed" })),
    );

    let page = browser.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/orders"));

    let page = browser.post_form("/checkout", &[("address_id", "5")]).await;
    assert_eq!(page.location(), Some("/cart"));
    assert_eq!(backend.requests_to(&Method::POST, "/api/cart/checkout").len(), 1);
}

#[tokio::test]
async fn test_cart_update_remove_clear_and_count() {
    let backend = FakeBackend::start().await;
    let mut browser = with_cart(&backend).await;

    backend.on(Method::PUT, "/api/cart/update", Canned::ok(cart_json(3)));
    let page = browser
        .post_form("/cart/update", &[("product_sku_id", "11"), ("quantity", "3")])
        .await;
    assert_eq!(page.location(), Some("/cart"));
    assert_eq!(
        backend.last(&Method::PUT, "/api/cart/update").json(),
        json!({ "product_sku_id": 11, "quantity": 3 })
    );

    backend.on(Method::GET, "/api/cart/count", Canned::ok(json!({ "count": 3 })));
    assert!(browser.get("/cart/count").await.body.contains(">3<"));

    // Quantity zero removes the line.
    backend.on(Method::DELETE, "/api/cart/remove", Canned::ok(cart_json(1)));
    browser
        .post_form("/cart/update", &[("product_sku_id", "11"), ("quantity", "0")])
        .await;
    assert_eq!(
        backend.last(&Method::DELETE, "/api/cart/remove").json(),
        json!({ "product_sku_id": 11 })
    );
    assert_eq!(backend.requests_to(&Method::PUT, "/api/cart/update").len(), 1);

    browser
        .post_form("/cart/remove", &[("product_sku_id", "11")])
        .await;
    assert_eq!(backend.requests_to(&Method::DELETE, "/api/cart/remove").len(), 2);

    backend.on(
        Method::DELETE,
        "/api/cart/clear",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Cart is locked" })),
    );
    let page = browser.post_form("/cart/clear", &[]).await;
    assert_eq!(page.location(), Some("/cart"));

    // The failed clear kept the one remaining item.
    backend.on(
        Method::GET,
        "/api/cart",
        Canned::json(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" })),
    );
    let page = browser.get("/cart").await;
    assert!(page.body.contains("Cart is locked"));
    assert!(page.body.contains("Linen Tee"));

    backend.set(Method::DELETE, "/api/cart/clear", Canned::ok(empty_cart_json()));
    browser.post_form("/cart/clear", &[]).await;
    let page = browser.get("/cart").await;
    assert!(page.body.contains("Your cart is empty"));
}
