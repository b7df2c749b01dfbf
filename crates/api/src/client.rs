//! Shared HTTP client for the backend.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{ACCEPT, COOKIE, HeaderValue, ORIGIN, REFERER};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::cookies::CookieJar;
use crate::error::ApiError;
use crate::types::{Category, Page, Pagination};

/// Header Sanctum reads the CSRF token from.
const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Correlation header forwarded from the incoming web request.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long public catalog data stays cached.
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Public URL of the front end, sent as `Origin`/`Referer` so Sanctum
    /// treats requests as coming from its stateful domain.
    pub origin: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    ActiveCategories,
}

/// Client for the backend REST API.
///
/// Cheap to clone. Holds no per-visitor state; pair it with a visitor's
/// [`CookieJar`] via [`ApiClient::session`] to make authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    origin: String,
    cache: Cache<CacheKey, Arc<Vec<Category>>>,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tidewater/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                origin: config.origin.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Backend base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL for a backend path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Resolve an `image_path` from the backend into a displayable URL.
    ///
    /// Absolute URLs pass through; relative paths are served by the backend.
    #[must_use]
    pub fn asset_url(&self, image_path: &str) -> String {
        if image_path.starts_with("http://") || image_path.starts_with("https://") {
            image_path.to_string()
        } else if image_path.starts_with('/') {
            self.url(image_path)
        } else {
            format!("{}/storage/{}", self.inner.base_url, image_path)
        }
    }

    /// Bind this client to one visitor's cookie jar.
    pub fn session<'a>(&'a self, jar: &'a mut CookieJar) -> ApiSession<'a> {
        ApiSession {
            client: self,
            jar,
            request_id: None,
        }
    }

    /// Check that the backend answers. Used by readiness probes.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSRF cookie endpoint cannot be reached or
    /// answers with a non-success status.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        let mut jar = CookieJar::default();
        self.session(&mut jar).csrf_cookie().await
    }

    /// Active categories for navigation, cached for five minutes.
    ///
    /// Fetched anonymously: public catalog data only.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails on a cache miss.
    #[instrument(skip(self))]
    pub async fn active_categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(cached) = self.inner.cache.get(&CacheKey::ActiveCategories).await {
            tracing::debug!("Cache hit for active categories");
            return Ok(cached);
        }

        let mut jar = CookieJar::default();
        let categories = Arc::new(self.session(&mut jar).public_categories().await?);
        self.inner
            .cache
            .insert(CacheKey::ActiveCategories, Arc::clone(&categories))
            .await;
        Ok(categories)
    }

    /// Drop cached catalog data after an admin edit.
    pub async fn invalidate_categories(&self) {
        self.inner
            .cache
            .invalidate(&CacheKey::ActiveCategories)
            .await;
    }
}

/// An [`ApiClient`] bound to one visitor's backend cookies.
///
/// Every request carries the jar's cookies and, when present, the decoded
/// `XSRF-TOKEN` in `X-XSRF-TOKEN`. Every response's `Set-Cookie` headers are
/// written back into the jar, so callers must persist the jar afterwards.
pub struct ApiSession<'a> {
    client: &'a ApiClient,
    jar: &'a mut CookieJar,
    request_id: Option<String>,
}

impl ApiSession<'_> {
    /// Forward a request ID on every backend call so logs on both sides line up.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// The visitor's cookie jar, as updated by the calls made so far.
    #[must_use]
    pub fn jar(&self) -> &CookieJar {
        self.jar
    }

    /// Forget every backend cookie held for this visitor.
    pub fn clear_cookies(&mut self) {
        self.jar.clear();
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        self.client
    }

    /// Build a request with the standard headers for this visitor.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let inner = &self.client.inner;
        let mut builder = inner
            .http
            .request(method, self.client.url(path))
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");

        if let Ok(origin) = HeaderValue::from_str(&inner.origin) {
            builder = builder
                .header(ORIGIN, origin)
                .header(REFERER, format!("{}/", inner.origin));
        }
        if let Some(cookies) = self.jar.header_value() {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(token) = self.jar.xsrf_token() {
            builder = builder.header(XSRF_HEADER, token);
        }
        if let Some(id) = &self.request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder
    }

    /// Send a request, absorb cookies, and decode the JSON body.
    ///
    /// An empty success body (e.g. `204 No Content`) yields `Value::Null`.
    pub(crate) async fn send(&mut self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "Backend request failed");
            ApiError::Http(e)
        })?;

        self.jar.absorb(response.headers());
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    path = %url,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, path = %url, error = %err, "Backend rejected request");
            }
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    pub(crate) async fn get(&mut self, path: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, path);
        self.send(builder).await
    }

    pub(crate) async fn get_with<Q: Serialize + ?Sized>(
        &mut self,
        path: &str,
        query: &Q,
    ) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, path).query(query);
        self.send(builder).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(builder).await
    }

    pub(crate) async fn patch<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let builder = self.request(Method::PATCH, path).json(body);
        self.send(builder).await
    }

    pub(crate) async fn delete(&mut self, path: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::DELETE, path);
        self.send(builder).await
    }

    /// `DELETE` with a JSON body (cart removal, image deletion).
    pub(crate) async fn delete_with<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let builder = self.request(Method::DELETE, path).json(body);
        self.send(builder).await
    }

    /// Fetch the CSRF cookie. Required before login and registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    #[instrument(skip(self))]
    pub async fn csrf_cookie(&mut self) -> Result<(), ApiError> {
        self.get("/sanctum/csrf-cookie").await.map(|_| ())
    }
}

/// Take the value under `key` from a response envelope and decode it.
pub(crate) fn take<T: DeserializeOwned>(mut value: Value, key: &'static str) -> Result<T, ApiError> {
    match value.get_mut(key).map(Value::take) {
        Some(Value::Null) | None => Err(ApiError::MissingField(key)),
        Some(inner) => Ok(serde_json::from_value(inner)?),
    }
}

/// Like [`take`], but a missing or null field is `None`.
pub(crate) fn take_opt<T: DeserializeOwned>(
    mut value: Value,
    key: &'static str,
) -> Result<Option<T>, ApiError> {
    match value.get_mut(key).map(Value::take) {
        Some(Value::Null) | None => Ok(None),
        Some(inner) => Ok(Some(serde_json::from_value(inner)?)),
    }
}

/// Decode a `{<key>: [...], pagination: {...}}` list response.
///
/// A missing pagination block is treated as a single page.
pub(crate) fn take_page<T: DeserializeOwned>(
    mut value: Value,
    key: &'static str,
) -> Result<Page<T>, ApiError> {
    let pagination = match value.get_mut("pagination").map(Value::take) {
        Some(Value::Null) | None => None,
        Some(p) => Some(serde_json::from_value::<Pagination>(p)?),
    };
    let items: Vec<T> = take_opt(value, key)?.unwrap_or_default();
    let pagination = pagination.unwrap_or_else(|| Pagination {
        per_page: u32::try_from(items.len()).unwrap_or(u32::MAX),
        total: items.len() as u64,
        ..Pagination::default()
    });
    Ok(Page { items, pagination })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::Choice;

    fn client() -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: "http://backend.test/".to_string(),
            origin: "http://shop.test".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_url_join_keeps_base() {
        let client = client();
        assert_eq!(client.base_url(), "http://backend.test");
        assert_eq!(client.url("/api/cart"), "http://backend.test/api/cart");
    }

    #[test]
    fn test_asset_url() {
        let client = client();
        assert_eq!(
            client.asset_url("https://cdn.test/a.jpg"),
            "https://cdn.test/a.jpg"
        );
        assert_eq!(
            client.asset_url("/storage/products/a.jpg"),
            "http://backend.test/storage/products/a.jpg"
        );
        assert_eq!(
            client.asset_url("products/a.jpg"),
            "http://backend.test/storage/products/a.jpg"
        );
    }

    #[test]
    fn test_request_carries_cookies_and_xsrf_header() {
        let client = client();
        let mut jar = CookieJar::default();
        jar.insert("XSRF-TOKEN", "tok%3D");
        jar.insert("shop_session", "abc");
        let session = client.session(&mut jar);

        let request = session
            .request(Method::POST, "/api/cart/add")
            .build()
            .unwrap();
        let headers = request.headers();
        assert_eq!(headers[XSRF_HEADER], "tok=");
        assert_eq!(headers[COOKIE], "XSRF-TOKEN=tok%3D; shop_session=abc");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers["X-Requested-With"], "XMLHttpRequest");
        assert_eq!(headers[ORIGIN], "http://shop.test");
        assert_eq!(headers[REFERER], "http://shop.test/");
    }

    #[test]
    fn test_request_without_cookies() {
        let client = client();
        let mut jar = CookieJar::default();
        let session = client.session(&mut jar);
        let request = session.request(Method::GET, "/api/user").build().unwrap();
        assert!(request.headers().get(COOKIE).is_none());
        assert!(request.headers().get(XSRF_HEADER).is_none());
        assert!(request.headers().get(REQUEST_ID_HEADER).is_none());
    }

    #[test]
    fn test_request_forwards_request_id() {
        let client = client();
        let mut jar = CookieJar::default();
        let session = client
            .session(&mut jar)
            .with_request_id(Some("req-42".to_string()));
        let request = session.request(Method::GET, "/api/cart").build().unwrap();
        assert_eq!(request.headers()[REQUEST_ID_HEADER], "req-42");
    }

    #[test]
    fn test_take_envelope() {
        let choices: Vec<Choice> = take(
            json!({"statuses": [{"value": "pending", "label": "Pending"}]}),
            "statuses",
        )
        .unwrap();
        assert_eq!(choices[0].value, "pending");

        let missing = take::<Vec<Choice>>(json!({"other": []}), "statuses");
        assert!(matches!(missing, Err(ApiError::MissingField("statuses"))));

        let none: Option<Choice> = take_opt(json!({"address": null}), "address").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_take_page() {
        let page: Page<Choice> = take_page(
            json!({
                "items": [{"value": "a", "label": "A"}],
                "pagination": {"current_page": 2, "last_page": 4, "per_page": 1, "total": 4}
            }),
            "items",
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.pagination.has_next());

        let single: Page<Choice> =
            take_page(json!({"items": [{"value": "a", "label": "A"}]}), "items").unwrap();
        assert_eq!(single.pagination.total, 1);
        assert!(!single.pagination.has_next());
    }
}
