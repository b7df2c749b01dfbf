//! Per-request access to the backend as the signed-in admin.

use axum::{extract::FromRequestParts, http::request::Parts};
use tidewater_api::{ApiClient, ApiSession, CookieJar};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::RequestId;
use crate::models::session_keys;
use crate::state::AppState;

/// The admin's backend cookie jar plus the shared client.
///
/// Handlers call [`Backend::save`] after their backend calls so rotated
/// cookies are kept for the next request.
pub struct Backend {
    client: ApiClient,
    session: Session,
    jar: CookieJar,
    request_id: Option<String>,
}

impl Backend {
    /// A backend session bound to this admin's cookies.
    pub fn api(&mut self) -> ApiSession<'_> {
        self.client
            .session(&mut self.jar)
            .with_request_id(self.request_id.clone())
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Persist the cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(session_keys::BACKEND_COOKIES, &self.jar)
            .await
    }
}

impl FromRequestParts<AppState> for Backend {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let jar = session
            .get::<CookieJar>(session_keys::BACKEND_COOKIES)
            .await?
            .unwrap_or_default();

        Ok(Self {
            client: state.api().clone(),
            session,
            jar,
            request_id: parts.extensions.get::<RequestId>().map(|id| id.0.clone()),
        })
    }
}
