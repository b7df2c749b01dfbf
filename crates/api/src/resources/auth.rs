//! Sanctum session authentication.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tidewater_core::Email;
use tracing::instrument;

use crate::client::{ApiSession, take};
use crate::error::ApiError;
use crate::types::{Registration, User};

impl ApiSession<'_> {
    /// Log in with email and password.
    ///
    /// Fetches a fresh CSRF cookie first; the backend session cookie ends up
    /// in the jar.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (422) for wrong credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&mut self, email: &Email, password: &SecretString) -> Result<User, ApiError> {
        self.csrf_cookie().await?;
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let value = self.post("/api/login", &body).await?;
        take(value, "user")
    }

    /// Create an account. The backend logs the new user in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (422) with field errors for invalid input.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&mut self, registration: &Registration) -> Result<User, ApiError> {
        self.csrf_cookie().await?;
        let value = self.post("/api/register", &registration.to_json()).await?;
        take(value, "user")
    }

    /// End the backend session and forget its cookies.
    ///
    /// The jar is cleared even when the backend call fails.
    ///
    /// # Errors
    ///
    /// Returns the backend error, if any, after clearing the jar.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let result = self.post("/api/logout", &json!({})).await.map(|_| ());
        self.clear_cookies();
        result
    }
}
