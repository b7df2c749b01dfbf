//! Inventory alert route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{AlertQuery, InventoryAlert};
use tidewater_core::{AlertId, AlertType, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::redirect_with;
use crate::views::{PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 50;

/// Alert types that can be filtered on.
const ALERT_TYPES: [AlertType; 2] = [AlertType::LowStock, AlertType::OutOfStock];

/// Alert list filters. Unresolved alerts only unless `all=1`.
#[derive(Debug, Default, Deserialize)]
pub struct AlertFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub alert_type: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub all: Option<u8>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl AlertFilter {
    fn show_all(&self) -> bool {
        self.all == Some(1)
    }

    fn alert_type(&self) -> Option<AlertType> {
        let wanted = self.alert_type.as_deref()?;
        ALERT_TYPES.into_iter().find(|t| t.as_str() == wanted)
    }

    fn to_query(&self) -> AlertQuery {
        AlertQuery {
            unresolved: (!self.show_all()).then_some(1),
            alert_type: self.alert_type(),
            per_page: Some(PER_PAGE),
            page: self.page,
        }
    }
}

/// Alert list template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/alerts.html")]
pub struct AlertsTemplate {
    pub page: PageContext,
    pub alerts: Vec<InventoryAlert>,
    pub alert_types: Vec<SelectOption>,
    pub show_all: bool,
    pub pager: Pager,
}

/// Inventory alerts.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<AlertFilter>,
) -> Result<impl IntoResponse> {
    let result = backend.api().inventory_alerts(&filter.to_query()).await;
    backend.save().await?;
    let alerts = result?;

    let current = filter.alert_type().map(|t| t.as_str());
    Ok(AlertsTemplate {
        page,
        alert_types: ALERT_TYPES
            .iter()
            .map(|t| SelectOption::new(t.as_str(), t.label(), current))
            .collect(),
        pager: Pager::new(
            "/inventories/alerts",
            &alerts.pagination,
            &[
                ("alert_type", current.map(str::to_string)),
                ("all", filter.show_all().then(|| "1".to_string())),
            ],
        ),
        alerts: alerts.items,
        show_all: filter.show_all(),
    })
}

/// Mark an alert resolved.
#[instrument(skip_all, fields(admin_id = %admin.id, alert_id = %id))]
pub async fn resolve(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<AlertId>,
) -> Result<Response> {
    let result = backend.api().resolve_alert(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Alert resolved", "Could not resolve the alert")?;
    redirect_with(&backend, flash, "/inventories/alerts").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_unresolved() {
        let query = AlertFilter::default().to_query();
        assert_eq!(query.unresolved, Some(1));
        assert!(query.alert_type.is_none());
    }

    #[test]
    fn test_all_and_type_filters() {
        let filter = AlertFilter {
            alert_type: Some("out_of_stock".to_string()),
            all: Some(1),
            page: Some(2),
        };
        let query = filter.to_query();
        assert!(query.unresolved.is_none());
        assert_eq!(query.alert_type, Some(AlertType::OutOfStock));
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_unknown_alert_type_is_ignored() {
        let filter = AlertFilter {
            alert_type: Some("unknown".to_string()),
            ..AlertFilter::default()
        };
        assert!(filter.to_query().alert_type.is_none());
    }
}
