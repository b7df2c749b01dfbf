//! Checkout route handlers.
//!
//! The backend turns the cart into an order. We only check that a delivery
//! address was picked and that the mirror is not empty before asking.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tidewater_api::{Address, CheckoutInput};
use tidewater_core::{AddressId, empty_as_none};
use tracing::instrument;

use crate::cart::CartMirror;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, RequireAuth};
use crate::views::{AssetUrls, PageContext, SelectOption};

/// Payment method preselected when the backend offers it.
const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub address_id: Option<AddressId>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub note: Option<String>,
}

/// A delivery address radio button.
#[derive(Clone)]
pub struct AddressChoice {
    pub id: String,
    pub recipient: String,
    pub line: String,
    pub selected: bool,
}

impl AddressChoice {
    fn list(addresses: &[Address]) -> Vec<Self> {
        let preselected = addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first())
            .map(|a| a.id);

        addresses
            .iter()
            .map(|a| Self {
                id: a.id.to_string(),
                recipient: a.recipient_name.clone(),
                line: a.one_line(),
                selected: Some(a.id) == preselected,
            })
            .collect()
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub mirror: CartMirror,
    pub assets: AssetUrls,
    pub addresses: Vec<AddressChoice>,
    pub payment_methods: Vec<SelectOption>,
}

/// Display the checkout page with a fresh cart, saved addresses and the
/// payment methods the backend accepts.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    let mut mirror = CartMirror::load(backend.session()).await;
    let refreshed = mirror.fetch(&mut backend.api()).await;
    let addresses = backend.api().addresses().await;
    let methods = backend.api().payment_methods().await;
    backend.save().await?;
    mirror.save(backend.session()).await?;

    if let Err(e) = refreshed
        && e.is_unauthenticated()
    {
        return Err(e.into());
    }
    if mirror.is_empty() {
        set_flash(backend.session(), Flash::error("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let addresses = addresses?;
    let methods = methods?;
    let current_method = methods
        .iter()
        .find(|c| c.value == DEFAULT_PAYMENT_METHOD)
        .or_else(|| methods.first())
        .map(|c| c.value.clone());

    Ok(CheckoutTemplate {
        page,
        mirror,
        assets: AssetUrls::new(backend.client().clone()),
        addresses: AddressChoice::list(&addresses),
        payment_methods: SelectOption::from_choices(&methods, current_method.as_deref()),
    }
    .into_response())
}

/// Place the order.
///
/// Missing address or an empty cart never reach the backend. On success
/// the cart mirror is reset and the customer lands on the new order, or on
/// the order list when the backend's answer did not say which order it was.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(address_id) = form.address_id else {
        set_flash(
            backend.session(),
            Flash::error("Please choose a delivery address"),
        )
        .await?;
        return Ok(Redirect::to("/checkout").into_response());
    };

    let mut mirror = CartMirror::load(backend.session()).await;
    if mirror.is_empty() {
        set_flash(backend.session(), Flash::error("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    add_breadcrumb("checkout", "Place order", None);
    let input = CheckoutInput {
        address_id,
        payment_method: form
            .payment_method
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        note: form.note,
    };
    let result = mirror.checkout(&mut backend.api(), &input).await;
    backend.save().await?;
    mirror.save(backend.session()).await?;

    match result {
        Ok(Some(order)) => {
            tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order placed");
            let notice = if order.order_number.is_empty() {
                "Thank you! Your order has been placed.".to_string()
            } else {
                format!("Thank you! Order {} has been placed.", order.order_number)
            };
            set_flash(backend.session(), Flash::notice(notice)).await?;
            Ok(Redirect::to(&format!("/orders/{}", order.id)).into_response())
        }
        Ok(None) => {
            set_flash(
                backend.session(),
                Flash::notice("Thank you! Your order has been placed."),
            )
            .await?;
            Ok(Redirect::to("/orders").into_response())
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Checkout rejected");
            let message = mirror.error.clone().unwrap_or_default();
            set_flash(backend.session(), Flash::error(message)).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewater_core::UserId;

    use super::*;

    fn address(id: i64, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            user_id: UserId::new(1),
            address_type: tidewater_core::AddressType::Home,
            is_default,
            recipient_name: "Aoi Tanaka".to_string(),
            recipient_name_kana: None,
            postal_code: "150-0001".to_string(),
            prefecture: "Tokyo".to_string(),
            city: "Shibuya".to_string(),
            address_line1: "1-2-3 Jingumae".to_string(),
            address_line2: None,
            phone: "03-0000-0000".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_default_address_is_preselected() {
        let choices = AddressChoice::list(&[address(1, false), address(2, true)]);
        assert!(!choices[0].selected);
        assert!(choices[1].selected);
    }

    #[test]
    fn test_first_address_preselected_without_default() {
        let choices = AddressChoice::list(&[address(1, false), address(2, false)]);
        assert!(choices[0].selected);
        assert!(!choices[1].selected);
    }

    #[test]
    fn test_blank_address_is_none() {
        let form: CheckoutForm =
            serde_urlencoded_form("address_id=&payment_method=bank_transfer&note=");
        assert!(form.address_id.is_none());
        assert_eq!(form.payment_method.as_deref(), Some("bank_transfer"));
        assert!(form.note.is_none());
    }

    fn serde_urlencoded_form(body: &str) -> CheckoutForm {
        let uri: axum::http::Uri = format!("/checkout?{body}").parse().unwrap();
        axum::extract::Query::<CheckoutForm>::try_from_uri(&uri)
            .unwrap()
            .0
    }
}
