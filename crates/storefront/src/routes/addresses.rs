//! Address book route handlers.
//!
//! Required fields are checked here so an incomplete form is shown again
//! without a round trip to the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tidewater_api::{Address, AddressInput};
use tidewater_core::{AddressId, AddressType};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, RequireAuth};
use crate::views::{PageContext, SelectOption};

/// Address form as posted by the browser.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_name_kana: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub prefecture: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_type: String,
    /// Checkbox; present only when ticked.
    pub is_default: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AddressForm {
    fn to_input(&self) -> AddressInput {
        AddressInput {
            recipient_name: self.recipient_name.trim().to_string(),
            recipient_name_kana: optional(&self.recipient_name_kana),
            postal_code: self.postal_code.trim().to_string(),
            prefecture: self.prefecture.trim().to_string(),
            city: self.city.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: optional(&self.address_line2),
            phone: self.phone.trim().to_string(),
            address_type: AddressType::ALL
                .into_iter()
                .find(|t| t.as_str() == self.address_type)
                .unwrap_or_default(),
            is_default: self.is_default.is_some(),
        }
    }
}

/// Address book page template.
#[derive(Template, WebTemplate)]
#[template(path = "addresses/index.html")]
pub struct AddressesIndexTemplate {
    pub page: PageContext,
    pub addresses: Vec<Address>,
}

/// New/edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "addresses/form.html")]
pub struct AddressFormTemplate {
    pub page: PageContext,
    pub title: String,
    pub action: String,
    pub input: AddressInput,
    pub address_types: Vec<SelectOption>,
    pub errors: Vec<String>,
}

impl AddressFormTemplate {
    fn new(page: PageContext, action: String, input: AddressInput, errors: Vec<String>) -> Self {
        let title = if action == "/addresses" {
            "New address"
        } else {
            "Edit address"
        };
        let current = input.address_type.as_str();
        let address_types = AddressType::ALL
            .iter()
            .map(|t| SelectOption::new(t.as_str(), t.label(), Some(current)))
            .collect();
        Self {
            page,
            title: title.to_string(),
            action,
            input,
            address_types,
            errors,
        }
    }
}

/// List saved addresses.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let result = backend.api().addresses().await;
    backend.save().await?;
    Ok(AddressesIndexTemplate {
        page,
        addresses: result?,
    })
}

/// Blank address form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn new(RequireAuth(user): RequireAuth, page: PageContext) -> impl IntoResponse {
    AddressFormTemplate::new(
        page,
        "/addresses".to_string(),
        AddressInput::default(),
        Vec::new(),
    )
}

/// Create an address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let input = form.to_input();
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Ok(invalid(page, "/addresses".to_string(), input, &missing));
    }

    let result = backend.api().create_address(&input).await;
    backend.save().await?;
    finish(&backend, page, "/addresses".to_string(), input, result.map(|_| ()), "Address saved").await
}

/// Edit form pre-filled from the backend.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn edit(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<AddressId>,
) -> Result<impl IntoResponse> {
    let result = backend.api().address(id).await;
    backend.save().await?;
    let address = result?;
    Ok(AddressFormTemplate::new(
        page,
        format!("/addresses/{id}"),
        AddressInput::from(&address),
        Vec::new(),
    ))
}

/// Update an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let action = format!("/addresses/{id}");
    let input = form.to_input();
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Ok(invalid(page, action, input, &missing));
    }

    let result = backend.api().update_address(id, &input).await;
    backend.save().await?;
    finish(&backend, page, action, input, result.map(|_| ()), "Address updated").await
}

/// Delete an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let result = backend.api().delete_address(id).await;
    backend.save().await?;
    let flash = match result {
        Ok(()) => Flash::notice("Address deleted"),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => Flash::error(e.user_message("Could not delete the address")),
    };
    set_flash(backend.session(), flash).await?;
    Ok(Redirect::to("/addresses").into_response())
}

/// Make an address the default.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn make_default(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let result = backend.api().set_default_address(id).await;
    backend.save().await?;
    let flash = match result {
        Ok(_) => Flash::notice("Default address updated"),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => Flash::error(e.user_message("Could not update the default address")),
    };
    set_flash(backend.session(), flash).await?;
    Ok(Redirect::to("/addresses").into_response())
}

fn invalid(page: PageContext, action: String, input: AddressInput, missing: &[&str]) -> Response {
    let errors = missing.iter().map(|f| format!("{f} is required")).collect();
    AddressFormTemplate::new(page, action, input, errors).into_response()
}

/// Redirect to the list on success, or show the form again with the
/// backend's messages.
async fn finish(
    backend: &Backend,
    page: PageContext,
    action: String,
    input: AddressInput,
    result: std::result::Result<(), tidewater_api::ApiError>,
    notice: &str,
) -> Result<Response> {
    match result {
        Ok(()) => {
            set_flash(backend.session(), Flash::notice(notice)).await?;
            Ok(Redirect::to("/addresses").into_response())
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let mut errors = e.field_messages();
            if errors.is_empty() {
                errors.push(e.user_message("Could not save the address"));
            }
            Ok(AddressFormTemplate::new(page, action, input, errors).into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_to_input_trims_and_defaults() {
        let form = AddressForm {
            recipient_name: " Aoi Tanaka ".to_string(),
            postal_code: "150-0001".to_string(),
            prefecture: "Tokyo".to_string(),
            city: "Shibuya".to_string(),
            address_line1: "1-2-3 Jingumae".to_string(),
            address_line2: "  ".to_string(),
            phone: "03-0000-0000".to_string(),
            address_type: "office".to_string(),
            is_default: Some("on".to_string()),
            ..AddressForm::default()
        };
        let input = form.to_input();
        assert_eq!(input.recipient_name, "Aoi Tanaka");
        assert!(input.address_line2.is_none());
        assert!(input.recipient_name_kana.is_none());
        assert_eq!(input.address_type, AddressType::Office);
        assert!(input.is_default);
        assert!(input.missing_fields().is_empty());
    }

    #[test]
    fn test_unknown_address_type_falls_back_to_home() {
        let form = AddressForm {
            address_type: "castle".to_string(),
            ..AddressForm::default()
        };
        let input = form.to_input();
        assert_eq!(input.address_type, AddressType::Home);
        assert!(!input.is_default);
        assert_eq!(input.missing_fields().len(), 6);
    }

    #[test]
    fn test_invalid_form_renders_errors() {
        let input = AddressInput::default();
        let response = invalid(
            PageContext::default(),
            "/addresses".to_string(),
            input,
            &["City"],
        );
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
