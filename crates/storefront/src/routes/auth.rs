//! Authentication route handlers.
//!
//! Login and registration go through the backend's Sanctum session. The
//! backend cookies land in the visitor's jar; the user it returns is copied
//! into our session as [`CurrentUser`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tidewater_api::Registration;
use tidewater_core::Email;
use tracing::instrument;

use crate::cart::CartMirror;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::views::{PageContext, SelectOption};

/// Shortest password the form accepts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Gender choices offered at registration.
const GENDERS: [(&str, &str); 3] = [("male", "Male"), ("female", "Female"), ("other", "Other")];

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_kana: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

impl RegisterForm {
    /// Check the form locally and build the backend payload.
    fn validate(&self) -> std::result::Result<Registration, Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(format!("Invalid email: {e}"));
                None
            }
        };
        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if self.password.expose_secret() != self.password_confirmation.expose_secret() {
            errors.push("Passwords do not match".to_string());
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Registration {
                name: self.name.trim().to_string(),
                name_kana: non_blank(&self.name_kana),
                gender: self.gender.trim().to_string(),
                birthday: self.birthday.trim().to_string(),
                email,
                phone: non_blank(&self.phone),
                password: self.password.clone(),
                password_confirmation: self.password_confirmation.clone(),
            }),
            _ => Err(errors),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub name_kana: String,
    pub genders: Vec<SelectOption>,
    pub birthday: String,
    pub email: String,
    pub phone: String,
    pub errors: Vec<String>,
}

impl RegisterTemplate {
    fn new(page: PageContext, form: Option<&RegisterForm>, errors: Vec<String>) -> Self {
        let gender = form.map(|f| f.gender.as_str());
        let genders = GENDERS
            .iter()
            .map(|(value, label)| SelectOption::new(*value, *label, gender))
            .collect();
        let Some(form) = form else {
            return Self {
                page,
                name: String::new(),
                name_kana: String::new(),
                genders,
                birthday: String::new(),
                email: String::new(),
                phone: String::new(),
                errors,
            };
        };
        Self {
            page,
            name: form.name.clone(),
            name_kana: form.name_kana.clone(),
            genders,
            birthday: form.birthday.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            errors,
        }
    }
}

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
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
        Err(e) => {
            return Ok(LoginTemplate {
                page,
                email: form.email,
                error: Some(format!("Invalid email: {e}")),
            }
            .into_response());
        }
    };

    let result = backend.api().login(&email, &form.password).await;
    backend.save().await?;

    match result {
        Ok(user) => {
            let user = CurrentUser::from(user);
            sign_in(&backend, &user).await?;
            tracing::info!(user_id = %user.id, "Customer logged in");
            set_flash(
                backend.session(),
                Flash::notice(format!("Welcome back, {}", user.name)),
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(LoginTemplate {
                page,
                email: form.email,
                error: Some(e.user_message("Login failed. Please check your email and password.")),
            }
            .into_response())
        }
    }
}

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate::new(page, None, Vec::new())
}

/// Handle registration form submission. The backend logs the new
/// account in.
#[instrument(skip_all)]
pub async fn register(
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => return Ok(RegisterTemplate::new(page, Some(&form), errors).into_response()),
    };

    let result = backend.api().register(&registration).await;
    backend.save().await?;

    match result {
        Ok(user) => {
            let user = CurrentUser::from(user);
            sign_in(&backend, &user).await?;
            tracing::info!(user_id = %user.id, "Customer registered");
            set_flash(
                backend.session(),
                Flash::notice("Your account has been created"),
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let mut errors = e.field_messages();
            if errors.is_empty() {
                errors.push(e.user_message("Registration failed. Please try again."));
            }
            Ok(RegisterTemplate::new(page, Some(&form), errors).into_response())
        }
    }
}

/// Handle logout. Local state is cleared even if the backend call fails.
#[instrument(skip_all)]
pub async fn logout(mut backend: Backend) -> Result<Response> {
    if let Err(e) = backend.api().logout().await {
        tracing::warn!(error = %e, "Backend logout failed");
    }
    clear_current_user(backend.session()).await?;
    clear_sentry_user();
    set_flash(backend.session(), Flash::notice("You have been logged out")).await?;
    Ok(Redirect::to("/").into_response())
}

/// Store the user and rotate the session ID. Any cart mirrored for a
/// previous login is dropped.
async fn sign_in(backend: &Backend, user: &CurrentUser) -> Result<()> {
    CartMirror::forget(backend.session()).await?;
    set_current_user(backend.session(), user).await?;
    backend.session().cycle_id().await?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirmation: &str) -> RegisterForm {
        RegisterForm {
            name: "Aoi Tanaka".to_string(),
            name_kana: String::new(),
            gender: "female".to_string(),
            birthday: "1990-04-01".to_string(),
            email: email.to_string(),
            phone: " ".to_string(),
            password: SecretString::from(password.to_string()),
            password_confirmation: SecretString::from(confirmation.to_string()),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = form("aoi@example.com", "sea-breeze", "sea-breeze")
            .validate()
            .unwrap();
        assert_eq!(registration.email.as_str(), "aoi@example.com");
        assert!(registration.phone.is_none());
        assert!(registration.name_kana.is_none());
    }

    #[test]
    fn test_password_mismatch() {
        let errors = form("aoi@example.com", "sea-breeze", "sea-breeze!")
            .validate()
            .unwrap_err();
        assert_eq!(errors, vec!["Passwords do not match".to_string()]);
    }

    #[test]
    fn test_short_password_and_bad_email() {
        let errors = form("not-an-email", "short", "short").validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Invalid email"));
        assert!(errors[1].contains("at least 8"));
    }

    #[test]
    fn test_register_template_keeps_input() {
        let f = form("aoi@example.com", "x", "y");
        let template = RegisterTemplate::new(PageContext::default(), Some(&f), Vec::new());
        assert_eq!(template.name, "Aoi Tanaka");
        assert!(template.genders.iter().any(|g| g.value == "female" && g.selected));
    }
}
