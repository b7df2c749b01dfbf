//! One-shot status messages shown after a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Notice,
    Error,
}

/// A message rendered once at the top of the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Notice on success, otherwise the backend's message.
    ///
    /// Unauthenticated errors are handed back so the caller can end the
    /// session instead of showing a message.
    ///
    /// # Errors
    ///
    /// Returns the original error when the backend session has expired.
    pub fn from_result<T>(
        result: Result<T, tidewater_api::ApiError>,
        notice: &str,
        fallback: &str,
    ) -> Result<Self, tidewater_api::ApiError> {
        match result {
            Ok(_) => Ok(Self::notice(notice)),
            Err(e) if e.is_unauthenticated() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "{fallback}");
                Ok(Self::error(e.user_message(fallback)))
            }
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Notice => "flash-notice",
            FlashKind::Error => "flash-error",
        }
    }
}

/// Store a flash message, replacing any unread one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending flash message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tidewater_api::ApiError;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_round_trip_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set_flash(&session, Flash::notice("Shipment packed"))
            .await
            .unwrap();
        assert_eq!(
            take_flash(&session).await.unwrap().message,
            "Shipment packed"
        );
        assert!(take_flash(&session).await.is_none());
    }

    #[test]
    fn test_from_result_uses_backend_message() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"All items must be picked before packing"}"#,
        );
        let flash = Flash::from_result::<()>(Err(err), "Packed", "Could not pack").unwrap();
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.message, "All items must be picked before packing");

        let flash = Flash::from_result(Ok(()), "Packed", "Could not pack").unwrap();
        assert_eq!(flash, Flash::notice("Packed"));
    }

    #[test]
    fn test_from_result_passes_expiry_through() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "{}");
        assert!(Flash::from_result::<()>(Err(err), "ok", "failed").is_err());
    }
}
