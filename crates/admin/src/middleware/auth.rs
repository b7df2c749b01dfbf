//! Authentication middleware and extractors for admin.
//!
//! An admin is signed in when the session holds a [`CurrentAdmin`] whose
//! role is `admin`. The backend enforces the same rule on every admin
//! endpoint; checking here keeps customers from seeing the console at all.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tidewater_api::CookieJar;
use tower_sessions::Session;

use crate::error::{BackendSessionExpired, clear_sentry_user};
use crate::flash::{Flash, set_flash};
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in admin.
///
/// Not signed in: redirect to `/login` (401 for HTMX requests).
/// Signed in without the admin role: 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when an admin is required.
#[derive(Debug)]
pub enum AdminRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX requests).
    Unauthorized,
    /// Signed in, but not as an admin.
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only administrators can access this console",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if parts.headers.contains_key("hx-request") {
                    AdminRejection::Unauthorized
                } else {
                    AdminRejection::RedirectToLogin
                }
            })?;

        if !admin.role.is_admin() {
            tracing::warn!(user_id = %admin.id, "Non-admin account reached the console");
            return Err(AdminRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin and their backend cookies.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session
        .remove::<CookieJar>(session_keys::BACKEND_COOKIES)
        .await?;
    Ok(())
}

/// Drop local login state when a handler reports that the backend session
/// has expired.
pub async fn expire_backend_session_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<BackendSessionExpired>().is_some() {
        if let Err(e) = clear_current_admin(&session).await {
            tracing::error!(error = %e, "Failed to clear expired admin session");
        }
        clear_sentry_user();
        let flash = Flash::error("Your session has expired. Please log in again.");
        if let Err(e) = set_flash(&session, flash).await {
            tracing::error!(error = %e, "Failed to set flash message");
        }
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request as HttpRequest;
    use tidewater_core::{UserId, UserRole};
    use tower_sessions::MemoryStore;

    use super::*;

    fn admin(role: UserRole) -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(1),
            email: "ops@tidewater.test".to_string(),
            name: "Ops".to_string(),
            role,
        }
    }

    async fn extract(session: Option<Session>, htmx: bool) -> Result<RequireAdmin, AdminRejection> {
        let mut builder = HttpRequest::builder().uri("/orders");
        if htmx {
            builder = builder.header("HX-Request", "true");
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        RequireAdmin::from_request_parts(&mut parts, &()).await
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let result = extract(Some(new_session()), false).await;
        assert!(matches!(result, Err(AdminRejection::RedirectToLogin)));

        let result = extract(Some(new_session()), true).await;
        assert!(matches!(result, Err(AdminRejection::Unauthorized)));
    }

    #[tokio::test]
    async fn test_customer_is_forbidden() {
        let session = new_session();
        set_current_admin(&session, &admin(UserRole::Customer))
            .await
            .unwrap();
        let result = extract(Some(session), false).await;
        assert!(matches!(result, Err(AdminRejection::Forbidden)));
        assert_eq!(
            AdminRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_admin_passes_and_clear_removes_state() {
        let session = new_session();
        set_current_admin(&session, &admin(UserRole::Admin))
            .await
            .unwrap();
        let RequireAdmin(found) = extract(Some(session.clone()), false).await.unwrap();
        assert_eq!(found.name, "Ops");

        clear_current_admin(&session).await.unwrap();
        assert!(matches!(
            extract(Some(session), false).await,
            Err(AdminRejection::RedirectToLogin)
        ));
    }
}
