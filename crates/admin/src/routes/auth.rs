//! Admin authentication route handlers.
//!
//! Admins sign in with their backend account. Accounts without the admin
//! role are logged straight back out of the backend and turned away.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tidewater_core::Email;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::views::PageContext;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

impl LoginTemplate {
    fn failed(page: PageContext, email: String, error: impl Into<String>) -> Response {
        Self {
            page,
            email,
            error: Some(error.into()),
        }
        .into_response()
    }
}

/// Display the login page, or go to the dashboard when already signed in.
pub async fn login_page(page: PageContext) -> Response {
    if page.admin.as_ref().is_some_and(|a| a.role.is_admin()) {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return Ok(LoginTemplate::failed(page, form.email, format!("Invalid email: {e}"))),
    };

    let result = backend.api().login(&email, &form.password).await;

    let user = match result {
        Ok(user) => user,
        Err(e) => {
            backend.save().await?;
            tracing::warn!(error = %e, "Admin login failed");
            return Ok(LoginTemplate::failed(
                page,
                form.email,
                e.user_message("Login failed. Please check your email and password."),
            ));
        }
    };

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, "Non-admin account tried to sign in");
        if let Err(e) = backend.api().logout().await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
        clear_current_admin(backend.session()).await?;
        return Ok(LoginTemplate::failed(
            page,
            form.email,
            "This account does not have administrator access.",
        ));
    }

    backend.save().await?;
    let admin = CurrentAdmin::from(user);
    set_current_admin(backend.session(), &admin).await?;
    backend.session().cycle_id().await?;
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(user_id = %admin.id, "Admin logged in");

    set_flash(
        backend.session(),
        Flash::notice(format!("Signed in as {}", admin.name)),
    )
    .await?;
    Ok(Redirect::to("/").into_response())
}

/// Handle logout. Local state is cleared even if the backend call fails.
#[instrument(skip_all)]
pub async fn logout(mut backend: Backend) -> Result<Response> {
    if let Err(e) = backend.api().logout().await {
        tracing::warn!(error = %e, "Backend logout failed");
    }
    clear_current_admin(backend.session()).await?;
    clear_sentry_user();
    set_flash(backend.session(), Flash::notice("You have been logged out")).await?;
    Ok(Redirect::to("/login").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};
    use tidewater_core::{UserId, UserRole};

    use super::*;

    #[tokio::test]
    async fn test_login_page_redirects_signed_in_admin() {
        let page = PageContext {
            admin: Some(CurrentAdmin {
                id: UserId::new(1),
                email: "ops@tidewater.test".to_string(),
                name: "Ops".to_string(),
                role: UserRole::Admin,
            }),
            ..PageContext::default()
        };
        let response = login_page(page).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_login_page_renders_for_visitors() {
        let response = login_page(PageContext::default()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
