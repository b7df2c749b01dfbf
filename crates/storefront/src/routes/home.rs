//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tidewater_api::{ProductQuery, ProductSort};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::Backend;
use crate::state::AppState;
use crate::views::{AssetUrls, PageContext, ProductCard};

/// How many new arrivals the home page shows.
const NEW_ARRIVALS: u32 = 8;

/// A category link in the home page navigation.
#[derive(Clone)]
pub struct CategoryLink {
    pub id: String,
    pub name: String,
    pub depth: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub products: Vec<ProductCard>,
}

/// Display the home page: the category tree and the newest products.
///
/// A backend failure on the category list only hides the navigation; the
/// product list is required.
#[instrument(skip(state, backend, page))]
pub async fn home(
    State(state): State<AppState>,
    mut backend: Backend,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let categories = match state.api().active_categories().await {
        Ok(tree) => tidewater_api::Category::flatten(&tree)
            .into_iter()
            .map(|(depth, c)| CategoryLink {
                id: c.id.to_string(),
                name: c.name.clone(),
                depth,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories for home page");
            Vec::new()
        }
    };

    let query = ProductQuery {
        sort_by: Some(ProductSort::CreatedAt),
        per_page: Some(NEW_ARRIVALS),
        ..ProductQuery::default()
    };
    let result = backend.api().products(&query).await;
    backend.save().await?;
    let products = result?;

    let assets = AssetUrls::new(state.api().clone());
    Ok(HomeTemplate {
        page,
        categories,
        products: products
            .items
            .iter()
            .map(|p| ProductCard::new(p, &assets))
            .collect(),
    })
}
