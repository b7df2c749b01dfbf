//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tidewater_api::{Category, Product, ProductQuery, ProductSort};
use tidewater_core::{CategoryId, ProductId, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{Backend, OptionalAuth};
use crate::state::AppState;
use crate::views::{AssetUrls, PageContext, Pager, ProductCard, SelectOption};

/// Products per listing page.
const PER_PAGE: u32 = 12;

/// Listing filters from the query string. Blank inputs mean "any".
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl ProductFilter {
    fn sort(&self) -> Option<ProductSort> {
        let wanted = self.sort_by.as_deref()?;
        ProductSort::ALL.into_iter().find(|s| s.as_str() == wanted)
    }

    fn to_query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            category_id: self.category_id,
            min_price: self.min_price,
            max_price: self.max_price,
            sort_by: self.sort(),
            per_page: Some(PER_PAGE),
            page: self.page,
        }
    }

    fn pager_filters(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("search", self.search.clone()),
            ("category_id", self.category_id.map(|id| id.to_string())),
            ("min_price", self.min_price.map(|p| p.to_string())),
            ("max_price", self.max_price.map(|p| p.to_string())),
            ("sort_by", self.sort().map(|s| s.as_str().to_string())),
        ]
    }
}

/// One purchasable variant on the detail page.
#[derive(Clone)]
pub struct SkuView {
    pub id: String,
    pub sku_code: String,
    pub label: String,
    pub price: String,
    pub in_stock: bool,
    pub stock_note: Option<String>,
}

impl SkuView {
    fn new(sku: &tidewater_api::ProductSku) -> Self {
        let label = sku.variant_label();
        let stock_note = match sku.available_quantity {
            Some(q) if q <= 0 => Some("Out of stock".to_string()),
            Some(q) if q <= 5 => Some(format!("Only {q} left")),
            _ => None,
        };
        Self {
            id: sku.id.to_string(),
            sku_code: sku.sku_code.clone(),
            label: if label.is_empty() {
                sku.sku_code.clone()
            } else {
                label
            },
            price: sku.price().display(),
            in_stock: sku.in_stock(),
            stock_note,
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub pager: Pager,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub assets: AssetUrls,
    pub skus: Vec<SkuView>,
    pub logged_in: bool,
    pub is_favorite: bool,
}

/// Product listing with search, category, price range and sort.
#[instrument(skip(state, backend, page))]
pub async fn index(
    State(state): State<AppState>,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse> {
    let result = backend.api().products(&filter.to_query()).await;
    backend.save().await?;
    let products = result?;

    let current_category = filter.category_id.map(|id| id.to_string());
    let categories = match state.api().active_categories().await {
        Ok(tree) => Category::flatten(&tree)
            .into_iter()
            .map(|(depth, c)| {
                SelectOption::new(
                    c.id.to_string(),
                    format!("{}{}", "– ".repeat(depth), c.name),
                    current_category.as_deref(),
                )
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for filter");
            Vec::new()
        }
    };

    let current_sort = filter.sort().unwrap_or_default();
    let sorts = ProductSort::ALL
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.label(), Some(current_sort.as_str())))
        .collect();

    let assets = AssetUrls::new(state.api().clone());
    Ok(ProductsIndexTemplate {
        page,
        products: products
            .items
            .iter()
            .map(|p| ProductCard::new(p, &assets))
            .collect(),
        categories,
        sorts,
        search: filter.search.clone().unwrap_or_default(),
        min_price: filter.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: filter.max_price.map(|p| p.to_string()).unwrap_or_default(),
        pager: Pager::new("/products", &products.pagination, &filter.pager_filters()),
    })
}

/// Product detail with variants, stock hints and wishlist state.
#[instrument(skip(state, backend, page, auth))]
pub async fn show(
    State(state): State<AppState>,
    mut backend: Backend,
    page: PageContext,
    auth: OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let result = backend.api().product(id).await;
    let product = match result {
        Ok(product) => product,
        Err(e) => {
            backend.save().await?;
            return Err(e.into());
        }
    };

    let logged_in = auth.0.is_some();
    let is_favorite = if logged_in {
        match backend.api().is_favorite(id, None).await {
            Ok(flag) => flag,
            Err(e) if e.is_unauthenticated() => {
                backend.save().await?;
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to check wishlist state");
                false
            }
        }
    } else {
        false
    };
    backend.save().await?;

    let skus = product.active_skus().into_iter().map(SkuView::new).collect();

    Ok(ProductShowTemplate {
        page,
        skus,
        assets: AssetUrls::new(state.api().clone()),
        product,
        logged_in,
        is_favorite,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_blank_inputs_are_none() {
        let filter = parse_filter(
            "search=&category_id=&min_price=&max_price=&sort_by=&page=",
        );
        assert!(filter.search.is_none());
        assert!(filter.category_id.is_none());
        assert!(filter.min_price.is_none());
        assert_eq!(filter.to_query().per_page, Some(PER_PAGE));
    }

    #[test]
    fn test_filter_to_query() {
        let filter =
            parse_filter("search=linen&category_id=3&min_price=1000&sort_by=price_asc&page=2");
        let query = filter.to_query();
        assert_eq!(query.search.as_deref(), Some("linen"));
        assert_eq!(query.category_id, Some(CategoryId::new(3)));
        assert_eq!(query.min_price, Some(Decimal::from(1000)));
        assert_eq!(query.sort_by, Some(ProductSort::PriceAsc));
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_unknown_sort_is_ignored() {
        let filter = parse_filter("sort_by=cheapest");
        assert!(filter.to_query().sort_by.is_none());
    }

    fn parse_filter(query: &str) -> ProductFilter {
        let uri: axum::http::Uri = format!("/products?{query}").parse().unwrap();
        Query::<ProductFilter>::try_from_uri(&uri).unwrap().0
    }
}
