//! Display data shared by page templates.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tidewater_api::{ApiClient, Choice, Pagination, Product};
use tower_sessions::Session;

use crate::flash::{Flash, take_flash};
use crate::models::{CurrentUser, session_keys};

/// What the layout needs on every full page: who is signed in and the
/// pending flash message.
///
/// Extracting this consumes the flash, so only handlers that render a page
/// should ask for it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flash = take_flash(session).await;

        Ok(Self { user, flash })
    }
}

/// Resolves backend image paths to absolute URLs.
#[derive(Clone)]
pub struct AssetUrls {
    client: ApiClient,
}

impl AssetUrls {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn url(&self, image_path: &str) -> String {
        self.client.asset_url(image_path)
    }
}

/// A product tile for listings.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, assets: &AssetUrls) -> Self {
        let image = product.primary_image();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.as_ref().map(|c| c.name.clone()),
            price: product.min_price().map(|p| p.display()),
            image_url: image.map(|img| assets.url(&img.image_path)),
            image_alt: image
                .and_then(|img| img.alt_text.clone())
                .unwrap_or_else(|| product.name.clone()),
        }
    }
}

/// One `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: Option<&str>) -> Self {
        let value = value.into();
        let selected = current == Some(value.as_str());
        Self {
            value,
            label: label.into(),
            selected,
        }
    }

    /// Options from a backend choice list.
    #[must_use]
    pub fn from_choices(choices: &[Choice], current: Option<&str>) -> Vec<Self> {
        choices
            .iter()
            .map(|c| Self::new(c.value.clone(), c.label.clone(), current))
            .collect()
    }
}

/// Previous/next links that keep the active filters.
#[derive(Debug, Clone, Default)]
pub struct Pager {
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pager {
    /// Build links for `path`, carrying every non-empty filter value.
    #[must_use]
    pub fn new(path: &str, pagination: &Pagination, filters: &[(&str, Option<String>)]) -> Self {
        let link = |page: u32| {
            let mut query: Vec<String> = filters
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .as_deref()
                        .filter(|v| !v.is_empty())
                        .map(|v| format!("{key}={}", urlencoding::encode(v)))
                })
                .collect();
            query.push(format!("page={page}"));
            format!("{path}?{}", query.join("&"))
        };

        Self {
            current_page: pagination.current_page,
            last_page: pagination.last_page,
            total: pagination.total,
            prev_url: pagination.has_prev().then(|| link(pagination.prev_page())),
            next_url: pagination.has_next().then(|| link(pagination.next_page())),
        }
    }

    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.prev_url.is_none() && self.next_url.is_none()
    }
}
