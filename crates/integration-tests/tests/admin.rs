//! Admin console router end to end against the fake backend.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use tidewater_admin::config::AdminConfig;
use tidewater_admin::middleware::session::SESSION_COOKIE_NAME;
use tidewater_admin::state::AppState;
use tidewater_integration_tests::{Browser, Canned, FakeBackend, user_json};

fn browser(backend: &FakeBackend) -> Browser {
    let config = AdminConfig::from_lookup(backend.admin_env()).expect("config");
    let state = AppState::new(config).expect("state");
    Browser::new(tidewater_admin::app(state), SESSION_COOKIE_NAME)
}

async fn signed_in(backend: &FakeBackend) -> Browser {
    backend.on(
        Method::POST,
        "/api/login",
        Canned::ok(json!({ "user": user_json(1, "Kenji", "kenji@tidewater.test", "admin") })),
    );
    let mut browser = browser(backend);
    let page = browser
        .post_form(
            "/login",
            &[("email", "kenji@tidewater.test"), ("password", "secret")],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/"));
    browser
}

fn alerts_json() -> Value {
    json!({
        "alerts": [{
            "id": 7,
            "inventory_id": 3,
            "alert_type": "low_stock",
            "threshold_quantity": 5,
            "current_quantity": 2,
            "is_resolved": false,
            "created_at": "2026-10-01T09:30:00.000000Z",
            "inventory": {
                "id": 3, "product_sku_id": 11, "quantity": 4, "allocated_quantity": 2,
                "available_quantity": 2, "safety_stock": 5,
                "product_sku": {
                    "id": 11, "sku_code": "TEE-01-M",
                    "product": { "id": 3, "name": "Linen Tee" }
                }
            }
        }],
        "pagination": { "current_page": 1, "last_page": 1, "per_page": 50, "total": 1 }
    })
}

#[tokio::test]
async fn test_console_requires_sign_in() {
    let backend = FakeBackend::start().await;
    let mut browser = browser(&backend);

    for path in ["/", "/products", "/inventories/alerts", "/shipments/4"] {
        let page = browser.get(path).await;
        assert_eq!(page.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(page.location(), Some("/login"), "{path}");
    }
    assert_eq!(browser.get("/login").await.status, StatusCode::OK);
    assert!(
        backend
            .requests()
            .iter()
            .all(|r| !r.path.starts_with("/api/"))
    );
}

#[tokio::test]
async fn test_htmx_request_without_admin_gets_401() {
    let backend = FakeBackend::start().await;
    let request = axum::http::Request::get("/orders")
        .header("hx-request", "true")
        .body(axum::body::Body::empty())
        .expect("request");

    let page = browser(&backend).send(request).await;

    assert_eq!(page.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_account_is_refused() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::POST,
        "/api/login",
        Canned::ok(json!({ "user": user_json(7, "Hana", "hana@example.com", "customer") })),
    );
    backend.on(Method::POST, "/api/logout", Canned::ok(json!({})));
    let mut browser = browser(&backend);

    let page = browser
        .post_form("/login", &[("email", "hana@example.com"), ("password", "secret")])
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("This account does not have administrator access."));
    assert_eq!(backend.requests_to(&Method::POST, "/api/logout").len(), 1);
    assert_eq!(browser.get("/products").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_admin_csp_forbids_scripts() {
    let backend = FakeBackend::start().await;
    let page = browser(&backend).get("/login").await;

    let csp = page.headers["content-security-policy"].to_str().expect("csp");
    assert!(csp.contains("script-src 'none'"));
}

#[tokio::test]
async fn test_alert_list_defaults_to_unresolved() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(Method::GET, "/api/inventory-alerts", Canned::ok(alerts_json()));

    let page = browser.get("/inventories/alerts").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("TEE-01-M"));
    assert!(page.body.contains("Linen Tee"));
    assert!(page.body.contains("/inventories/alerts/7/resolve"));
    let query = backend
        .last(&Method::GET, "/api/inventory-alerts")
        .query
        .unwrap_or_default();
    assert!(query.contains("unresolved=1"));

    browser.get("/inventories/alerts?all=1&alert_type=out_of_stock").await;
    let query = backend
        .last(&Method::GET, "/api/inventory-alerts")
        .query
        .unwrap_or_default();
    assert!(!query.contains("unresolved"));
    assert!(query.contains("alert_type=out_of_stock"));
}

#[tokio::test]
async fn test_resolving_an_alert_flashes_and_redirects() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(
        Method::POST,
        "/api/inventory-alerts/7/resolve",
        Canned::ok(json!({ "message": "Alert resolved" })),
    );
    backend.on(Method::GET, "/api/inventory-alerts", Canned::ok(alerts_json()));

    let page = browser.post_form("/inventories/alerts/7/resolve", &[]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/inventories/alerts"));

    let page = browser.get("/inventories/alerts").await;
    assert!(page.body.contains("Alert resolved"));
}

#[tokio::test]
async fn test_rejected_shipment_action_redirects_back() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(
        Method::POST,
        "/api/admin/shipments/4/pack",
        Canned::unprocessable("All items must be picked before packing."),
    );

    let page = browser.post_form("/shipments/4/pack", &[]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/shipments/4"));

    assert_eq!(backend.requests_to(&Method::POST, "/api/admin/shipments/4/pack").len(), 1);
}

#[tokio::test]
async fn test_expired_backend_session_signs_admin_out() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(Method::GET, "/api/inventory-alerts", Canned::unauthenticated());

    let page = browser.get("/inventories/alerts").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/login"));

    let page = browser.get("/login").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("session has expired"));

    assert_eq!(browser.get("/orders").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_logout_returns_to_login() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(Method::POST, "/api/logout", Canned::ok(json!({})));

    let page = browser.post_form("/logout", &[]).await;

    assert_eq!(page.location(), Some("/login"));
    assert_eq!(backend.requests_to(&Method::POST, "/api/logout").len(), 1);
    assert_eq!(browser.get("/").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_category_choices_include_inactive_categories() {
    let backend = FakeBackend::start().await;
    let mut browser = signed_in(&backend).await;
    backend.on(
        Method::GET,
        "/api/categories/all",
        Canned::ok(json!({ "categories": [
            { "id": 2, "parent_id": 1, "name": "Shirts", "slug": "shirts", "is_active": false },
            { "id": 1, "name": "Tops", "slug": "tops" }
        ] })),
    );

    let page = browser.get("/products/new").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(">Tops<"));
    assert!(page.body.contains(">- Shirts<"));

    let page = browser.get("/categories/new").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(">- Shirts<"));

    assert_eq!(backend.requests_to(&Method::GET, "/api/categories/all").len(), 2);
    assert!(backend.requests_to(&Method::GET, "/api/categories").is_empty());
}
