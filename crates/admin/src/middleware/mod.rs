//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory, `SameSite=Strict`)
//! 5. Security headers (script-free CSP, HSTS on https)
//! 6. Backend session expiry (drop local login state after a 401/419)
//! 7. Rate limiting on the login form (governor)
//!
//! Admin-only access is enforced per handler by the [`RequireAdmin`]
//! extractor.

pub mod auth;
pub mod backend;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    RequireAdmin, clear_current_admin, expire_backend_session_middleware, set_current_admin,
};
pub use backend::Backend;
pub use rate_limit::login_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
