//! SKU management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tidewater_api::{Product, SkuInput};
use tidewater_core::{ProductId, SkuId};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{form_errors, non_blank, parse_optional, redirect_with};
use crate::views::PageContext;

/// SKU form as posted, both for adding and for inline edits.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SkuForm {
    #[serde(default)]
    pub sku_code: String,
    #[serde(default)]
    pub jan_code: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub other_attribute: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub cost_price: String,
    /// Checkbox; present only when ticked.
    pub is_active: Option<String>,
}

impl SkuForm {
    fn to_input(&self) -> std::result::Result<SkuInput, Vec<String>> {
        let mut errors = Vec::new();
        if self.sku_code.trim().is_empty() {
            errors.push("SKU code is required".to_string());
        }
        let price = parse_optional::<Decimal>(&self.price, "Price", &mut errors);
        if self.price.trim().is_empty() {
            errors.push("Price is required".to_string());
        }
        if price.is_some_and(|p| p.is_sign_negative()) {
            errors.push("Price cannot be negative".to_string());
        }
        let cost_price = parse_optional::<Decimal>(&self.cost_price, "Cost price", &mut errors);

        match price {
            Some(price) if errors.is_empty() => Ok(SkuInput {
                sku_code: self.sku_code.trim().to_string(),
                jan_code: non_blank(&self.jan_code),
                size: non_blank(&self.size),
                color: non_blank(&self.color),
                other_attribute: non_blank(&self.other_attribute),
                price,
                cost_price,
                is_active: self.is_active.is_some(),
            }),
            _ => Err(errors),
        }
    }
}

/// SKU list with the add form.
#[derive(Template, WebTemplate)]
#[template(path = "products/skus.html")]
pub struct SkusTemplate {
    pub page: PageContext,
    pub product: Product,
    /// Values of the add form, kept after a failed submit.
    pub form: SkuForm,
    pub errors: Vec<String>,
}

async fn render(
    backend: &mut Backend,
    page: PageContext,
    id: ProductId,
    form: SkuForm,
    errors: Vec<String>,
) -> Result<Response> {
    let result = backend.api().product(id).await;
    backend.save().await?;
    let product = result?;
    Ok(SkusTemplate {
        page,
        product,
        form,
        errors,
    }
    .into_response())
}

/// Product SKUs.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let form = SkuForm {
        is_active: Some("on".to_string()),
        ..SkuForm::default()
    };
    render(&mut backend, page, id, form, Vec::new()).await
}

/// Add a SKU.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ProductId>,
    Form(form): Form<SkuForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return render(&mut backend, page, id, form, errors).await,
    };

    let result = backend.api().add_skus(id, &[input]).await;
    backend.save().await?;
    match result {
        Ok(_) => {
            tracing::info!(sku_code = %form.sku_code.trim(), "SKU added");
            redirect_with(
                &backend,
                Flash::notice(format!("SKU {} added", form.sku_code.trim())),
                &format!("/products/{id}/skus"),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not add the SKU");
            render(&mut backend, page, id, form, errors).await
        }
    }
}

/// Update a SKU from its row in the list.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id, sku_id = %sku))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path((id, sku)): Path<(ProductId, SkuId)>,
    Form(form): Form<SkuForm>,
) -> Result<Response> {
    let to = format!("/products/{id}/skus");
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return redirect_with(&backend, Flash::error(errors.join(". ")), &to).await,
    };

    let result = backend.api().update_sku(id, sku, &input).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "SKU updated", "Could not update the SKU")?;
    redirect_with(&backend, flash, &to).await
}

/// Delete a SKU. The backend refuses SKUs that have been ordered.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id, sku_id = %sku))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path((id, sku)): Path<(ProductId, SkuId)>,
) -> Result<Response> {
    let result = backend.api().delete_sku(id, sku).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "SKU deleted", "Could not delete the SKU")?;
    redirect_with(&backend, flash, &format!("/products/{id}/skus")).await
}
