//! Authentication middleware and extractors.
//!
//! Login state is a [`CurrentUser`] in the session, copied from the backend
//! at login. The backend session behind it can still expire; handlers turn
//! a 401/419 into [`BackendSessionExpired`] and the middleware here drops the
//! local state to match.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tidewater_api::CookieJar;
use tower_sessions::Session;

use crate::cart::CartMirror;
use crate::error::{BackendSessionExpired, clear_sentry_user};
use crate::flash::{Flash, set_flash};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in customer.
///
/// If the visitor is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the visitor is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API and HTMX requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                let is_api = parts.uri.path().starts_with("/api/");
                let is_htmx = parts.headers.contains_key("hx-request");
                if is_api || is_htmx {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectToLogin
                }
            })?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is
/// not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear every piece of login state: the user, the backend
/// cookies and the cart mirror.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<CookieJar>(session_keys::BACKEND_COOKIES)
        .await?;
    CartMirror::forget(session).await?;
    Ok(())
}

/// Drop local login state when a handler reports that the backend no longer
/// knows this visitor.
pub async fn expire_backend_session_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<BackendSessionExpired>().is_some() {
        if let Err(e) = clear_current_user(&session).await {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
        clear_sentry_user();
        let flash = Flash::error("Your session has expired. Please log in again.");
        if let Err(e) = set_flash(&session, flash).await {
            tracing::error!(error = %e, "Failed to set flash message");
        }
    }

    response
}
