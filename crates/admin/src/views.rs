//! Display data shared by admin page templates.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tidewater_api::{ApiClient, Choice, Pagination};
use tower_sessions::Session;

use crate::flash::{Flash, take_flash};
use crate::models::{CurrentAdmin, session_keys};

/// Layout data: the signed-in admin, the pending flash and the current
/// path for sidebar highlighting.
///
/// Extracting this consumes the flash.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub admin: Option<CurrentAdmin>,
    pub flash: Option<Flash>,
    pub current_path: String,
}

impl PageContext {
    /// CSS class for a sidebar link.
    #[must_use]
    pub fn nav_class(&self, prefix: &str) -> &'static str {
        let active = if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        };
        if active { "nav-link active" } else { "nav-link" }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current_path = parts.uri.path().to_string();
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                current_path,
                ..Self::default()
            });
        };

        let admin = session
            .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();
        let flash = take_flash(session).await;

        Ok(Self {
            admin,
            flash,
            current_path,
        })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_class() {
        let page = PageContext {
            current_path: "/inventories/alerts".to_string(),
            ..PageContext::default()
        };
        assert_eq!(page.nav_class("/inventories"), "nav-link active");
        assert_eq!(page.nav_class("/orders"), "nav-link");
        assert_eq!(page.nav_class("/"), "nav-link");
    }

    #[test]
    fn test_pager_keeps_filters() {
        let pagination = Pagination {
            current_page: 1,
            last_page: 4,
            per_page: 20,
            total: 70,
        };
        let pager = Pager::new(
            "/inventories",
            &pagination,
            &[
                ("status", Some("low_stock".to_string())),
                ("sku_code", Some("TW 001".to_string())),
            ],
        );
        assert!(pager.prev_url.is_none());
        assert_eq!(
            pager.next_url.as_deref(),
            Some("/inventories?status=low_stock&sku_code=TW%20001&page=2")
        );
    }
}
