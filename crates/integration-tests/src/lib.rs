//! Test harness for Tidewater.
//!
//! [`FakeBackend`] stands in for the Laravel backend: a real HTTP server on
//! an ephemeral port that serves canned JSON and records every request it
//! receives. [`Browser`] drives a storefront or admin router in-process via
//! `tower::ServiceExt::oneshot`, carrying the session cookie between
//! requests the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidewater-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Encoded value of the CSRF cookie the fake backend hands out.
pub const XSRF_COOKIE_VALUE: &str = "tok%3Den";

/// The same token as the client must echo it (URL-decoded).
pub const XSRF_HEADER_VALUE: &str = "tok=en";

/// Value of the fake backend's session cookie.
pub const BACKEND_SESSION: &str = "laravel-1";

/// A canned backend response.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: Value,
    pub cookies: Vec<String>,
}

impl Canned {
    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// Laravel's validation failure shape.
    #[must_use]
    pub fn unprocessable(message: &str) -> Self {
        Self::json(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "message": message, "errors": {} }),
        )
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::json(StatusCode::UNAUTHORIZED, json!({ "message": "Unauthenticated." }))
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }
}

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body parsed as JSON, `Null` when empty or not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

type RouteKey = (Method, String);

#[derive(Default)]
struct Shared {
    /// Responses per route; the last one repeats once the queue drains.
    routes: Mutex<HashMap<RouteKey, VecDeque<Canned>>>,
    requests: Mutex<Vec<Recorded>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// In-process stand-in for the backend REST API.
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// `GET /sanctum/csrf-cookie` is pre-registered and sets the CSRF and
    /// session cookies.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(serve).with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        let backend = Self { addr, shared, task };
        backend.on(
            Method::GET,
            "/sanctum/csrf-cookie",
            Canned::json(StatusCode::NO_CONTENT, Value::Null)
                .with_cookie(format!("XSRF-TOKEN={XSRF_COOKIE_VALUE}; Path=/; SameSite=Lax"))
                .with_cookie(format!(
                    "laravel_session={BACKEND_SESSION}; Path=/; HttpOnly; SameSite=Lax"
                )),
        );
        backend
    }

    /// Base URL to point a client at.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a response for `method path`.
    pub fn on(&self, method: Method, path: &str, response: Canned) {
        lock(&self.shared.routes)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Replace every queued response for `method path`.
    pub fn set(&self, method: Method, path: &str, response: Canned) {
        lock(&self.shared.routes).insert((method, path.to_string()), VecDeque::from([response]));
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.shared.requests).clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    /// The most recent request for `method path`.
    #[must_use]
    pub fn last(&self, method: &Method, path: &str) -> Recorded {
        self.requests_to(method, path)
            .pop()
            .unwrap_or_else(|| panic!("no {method} {path} request was made"))
    }

    /// Environment for the storefront pointing at this backend.
    #[must_use]
    pub fn storefront_env(&self) -> impl Fn(&str) -> Option<String> + use<> {
        let backend = self.url();
        move |key| match key {
            "BACKEND_API_URL" => Some(backend.clone()),
            "STOREFRONT_BASE_URL" => Some("http://shop.tidewater.test".to_string()),
            _ => None,
        }
    }

    /// Environment for the admin console pointing at this backend.
    #[must_use]
    pub fn admin_env(&self) -> impl Fn(&str) -> Option<String> + use<> {
        let backend = self.url();
        move |key| match key {
            "BACKEND_API_URL" => Some(backend.clone()),
            "ADMIN_BASE_URL" => Some("http://admin.tidewater.test".to_string()),
            _ => None,
        }
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    lock(&shared.requests).push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let canned = {
        let mut routes = lock(&shared.routes);
        routes.get_mut(&(method, path)).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    let Some(canned) = canned else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": "No canned response" })),
        )
            .into_response();
    };

    let mut response = if canned.body.is_null() {
        canned.status.into_response()
    } else {
        (canned.status, axum::Json(canned.body)).into_response()
    };
    for cookie in canned.cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// A response with its body read.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Page {
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Drives a router in-process, keeping its session cookie.
pub struct Browser {
    router: Router,
    cookie_name: &'static str,
    cookie: Option<String>,
}

impl Browser {
    #[must_use]
    pub const fn new(router: Router, cookie_name: &'static str) -> Self {
        Self {
            router,
            cookie_name,
            cookie: None,
        }
    }

    /// Whether the app has handed out a session cookie.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, path: &str) -> Page {
        let request = Request::get(path).body(Body::empty()).expect("request");
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Page {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Page {
        if let Some(cookie) = &self.cookie
            && let Ok(value) = HeaderValue::from_str(&format!("{}={cookie}", self.cookie_name))
        {
            request.headers_mut().insert(header::COOKIE, value);
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=')
                && name.trim() == self.cookie_name
            {
                self.cookie = (!value.is_empty()).then(|| value.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        Page {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// A backend user record.
#[must_use]
pub fn user_json(id: i64, name: &str, email: &str, role: &str) -> Value {
    json!({ "id": id, "name": name, "email": email, "role": role })
}
