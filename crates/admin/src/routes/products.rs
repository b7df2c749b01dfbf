//! Product management route handlers.
//!
//! A new product is created together with its first SKU; further SKUs and
//! images are managed on their own pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tidewater_api::{Category, Product, ProductInput, ProductQuery, SkuInput};
use tidewater_core::{CategoryId, ProductId, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{form_errors, non_blank, parse_optional, redirect_with};
use crate::views::{PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 20;

/// Default consumption tax rate, in percent.
const DEFAULT_TAX_RATE: &str = "10";

/// Product list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
    /// `1` to list soft-deleted products.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub trashed: Option<u8>,
}

impl ProductFilter {
    fn is_trashed(&self) -> bool {
        self.trashed == Some(1)
    }

    fn to_query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            per_page: Some(PER_PAGE),
            page: self.page,
            ..ProductQuery::default()
        }
    }
}

/// Product form as posted. The SKU fields are only shown on the new form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tax_rate: String,
    /// Checkbox; present only when ticked.
    pub is_published: Option<String>,
    #[serde(default)]
    pub sort_order: String,
    #[serde(default)]
    pub sku_code: String,
    #[serde(default)]
    pub jan_code: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub cost_price: String,
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            product_code: product.product_code.clone(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            tax_rate: product.tax_rate.normalize().to_string(),
            is_published: product.is_published.then(|| "on".to_string()),
            sort_order: product.sort_order.to_string(),
            ..Self::default()
        }
    }

    fn blank() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE.to_string(),
            sort_order: "0".to_string(),
            ..Self::default()
        }
    }

    /// Build the backend payload; `with_sku` also requires the first SKU.
    fn to_input(&self, with_sku: bool) -> std::result::Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        if self.product_code.trim().is_empty() {
            errors.push("Product code is required".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        let category_id = parse_optional::<i64>(&self.category_id, "Category", &mut errors)
            .map(CategoryId::new);
        let tax_rate = parse_optional::<Decimal>(&self.tax_rate, "Tax rate", &mut errors);
        let sort_order = parse_optional::<i32>(&self.sort_order, "Sort order", &mut errors);

        let mut skus = Vec::new();
        if with_sku {
            if self.sku_code.trim().is_empty() {
                errors.push("SKU code is required".to_string());
            }
            let price = parse_optional::<Decimal>(&self.price, "Price", &mut errors);
            if price.is_none() && self.price.trim().is_empty() {
                errors.push("Price is required".to_string());
            }
            let cost_price = parse_optional::<Decimal>(&self.cost_price, "Cost price", &mut errors);
            if let Some(price) = price {
                skus.push(SkuInput {
                    sku_code: self.sku_code.trim().to_string(),
                    jan_code: non_blank(&self.jan_code),
                    size: non_blank(&self.size),
                    color: non_blank(&self.color),
                    other_attribute: None,
                    price,
                    cost_price,
                    is_active: true,
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let is_published = self.is_published.is_some();
        Ok(ProductInput {
            category_id,
            product_code: self.product_code.trim().to_string(),
            name: self.name.trim().to_string(),
            description: non_blank(&self.description),
            tax_rate,
            is_published,
            published_at: is_published.then(|| chrono::Utc::now().to_rfc3339()),
            sort_order,
            skus,
            images: Vec::new(),
        })
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub search: String,
    pub trashed: bool,
    pub pager: Pager,
}

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub title: String,
    pub action: String,
    /// Set on the edit form.
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub categories: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Category options indented by depth.
pub(crate) fn category_options(tree: &[Category], current: Option<&str>) -> Vec<SelectOption> {
    Category::flatten(tree)
        .into_iter()
        .map(|(depth, category)| {
            SelectOption::new(
                category.id.to_string(),
                format!("{}{}", "- ".repeat(depth), category.name),
                current,
            )
        })
        .collect()
}

async fn load_categories(backend: &mut Backend, current: &str) -> Result<Vec<SelectOption>> {
    match backend.api().all_categories().await {
        Ok(all) => Ok(category_options(&Category::nest(all), Some(current))),
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Ok(Vec::new())
        }
    }
}

async fn render_form(
    backend: &mut Backend,
    page: PageContext,
    product_id: Option<ProductId>,
    form: ProductForm,
    errors: Vec<String>,
) -> Result<Response> {
    let categories = load_categories(backend, &form.category_id).await?;
    backend.save().await?;
    let (title, action) = match product_id {
        Some(id) => ("Edit product".to_string(), format!("/products/{id}")),
        None => ("New product".to_string(), "/products".to_string()),
    };
    Ok(ProductFormTemplate {
        page,
        title,
        action,
        product_id,
        form,
        categories,
        errors,
    }
    .into_response())
}

/// List products, or the trash with `trashed=1`.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse> {
    let query = filter.to_query();
    let result = if filter.is_trashed() {
        backend.api().trashed_products(&query).await
    } else {
        backend.api().products(&query).await
    };
    backend.save().await?;
    let products = result?;

    let trashed = filter.is_trashed().then(|| "1".to_string());
    Ok(ProductsIndexTemplate {
        page,
        pager: Pager::new(
            "/products",
            &products.pagination,
            &[("search", filter.search.clone()), ("trashed", trashed)],
        ),
        products: products.items,
        search: filter.search.clone().unwrap_or_default(),
        trashed: filter.is_trashed(),
    })
}

/// Blank product form.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    render_form(&mut backend, page, None, ProductForm::blank(), Vec::new()).await
}

/// Create a product with its first SKU.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.to_input(true) {
        Ok(input) => input,
        Err(errors) => return render_form(&mut backend, page, None, form, errors).await,
    };

    let result = backend.api().create_product(&input).await;
    backend.save().await?;
    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            redirect_with(
                &backend,
                Flash::notice(format!("Product {} created", product.name)),
                &format!("/products/{}/edit", product.id),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not create the product");
            render_form(&mut backend, page, None, form, errors).await
        }
    }
}

/// Edit form pre-filled from the backend.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let result = backend.api().product(id).await;
    backend.save().await?;
    let product = result?;
    render_form(
        &mut backend,
        page,
        Some(id),
        ProductForm::from_product(&product),
        Vec::new(),
    )
    .await
}

/// Update product details.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.to_input(false) {
        Ok(input) => input,
        Err(errors) => return render_form(&mut backend, page, Some(id), form, errors).await,
    };

    let result = backend.api().update_product(id, &input).await;
    backend.save().await?;
    match result {
        Ok(_) => {
            redirect_with(
                &backend,
                Flash::notice("Product updated"),
                &format!("/products/{id}/edit"),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not update the product");
            render_form(&mut backend, page, Some(id), form, errors).await
        }
    }
}

/// Move a product to the trash.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let result = backend.api().delete_product(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Product moved to trash", "Could not delete the product")?;
    redirect_with(&backend, flash, "/products").await
}

/// Restore a product from the trash.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn restore(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let result = backend.api().restore_product(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Product restored", "Could not restore the product")?;
    redirect_with(&backend, flash, "/products?trashed=1").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ProductForm {
        ProductForm {
            category_id: "2".to_string(),
            product_code: "TW-001".to_string(),
            name: " Linen Shirt ".to_string(),
            is_published: Some("on".to_string()),
            sku_code: "TW-001-M".to_string(),
            size: "M".to_string(),
            price: "4800".to_string(),
            ..ProductForm::blank()
        }
    }

    #[test]
    fn test_new_product_includes_first_sku() {
        let input = valid_form().to_input(true).unwrap();
        assert_eq!(input.name, "Linen Shirt");
        assert_eq!(input.category_id, Some(CategoryId::new(2)));
        assert_eq!(input.tax_rate, Some(Decimal::from(10)));
        assert!(input.published_at.is_some());
        assert_eq!(input.skus.len(), 1);
        assert_eq!(input.skus[0].size.as_deref(), Some("M"));
        assert!(input.skus[0].color.is_none());
    }

    #[test]
    fn test_update_ignores_sku_fields() {
        let form = ProductForm {
            price: String::new(),
            sku_code: String::new(),
            is_published: None,
            ..valid_form()
        };
        let input = form.to_input(false).unwrap();
        assert!(input.skus.is_empty());
        assert!(input.published_at.is_none());
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let form = ProductForm {
            product_code: String::new(),
            tax_rate: "ten".to_string(),
            price: String::new(),
            ..valid_form()
        };
        let errors = form.to_input(true).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Product code is required".to_string(),
                "Tax rate must be a number".to_string(),
                "Price is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_category_options_indent_children() {
        let tree: Vec<Category> = serde_json::from_str(
            r#"[{"id":1,"name":"Tops","slug":"tops","children":[
                    {"id":2,"parent_id":1,"name":"Shirts","slug":"shirts"}]}]"#,
        )
        .unwrap();
        let options = category_options(&tree, Some("2"));
        assert_eq!(options[1].label, "- Shirts");
        assert!(options[1].selected);
        assert!(!options[0].selected);
    }
}
