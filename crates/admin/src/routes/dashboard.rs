//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tidewater_api::{AlertQuery, ApiError, Order, OrderQuery};
use tidewater_core::OrderStatus;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{Backend, RequireAdmin};
use crate::views::PageContext;

/// How many recent orders the dashboard lists.
const RECENT_ORDERS: u32 = 5;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    /// `None` when the alert count could not be loaded.
    pub unresolved_alerts: Option<u64>,
    pub pending_orders: Option<u64>,
    pub recent_orders: Vec<Order>,
}

/// Dashboard overview.
///
/// Each panel loads independently; a failing panel is left blank rather
/// than failing the page.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let alerts = backend
        .api()
        .inventory_alerts(&AlertQuery {
            unresolved: Some(1),
            per_page: Some(1),
            ..AlertQuery::default()
        })
        .await;
    let pending = backend
        .api()
        .admin_orders(&OrderQuery {
            status: Some(OrderStatus::Pending),
            per_page: Some(1),
            ..OrderQuery::default()
        })
        .await;
    let recent = backend
        .api()
        .admin_orders(&OrderQuery {
            per_page: Some(RECENT_ORDERS),
            ..OrderQuery::default()
        })
        .await;
    backend.save().await?;

    Ok(DashboardTemplate {
        page,
        unresolved_alerts: panel(alerts)?.map(|p| p.pagination.total),
        pending_orders: panel(pending)?.map(|p| p.pagination.total),
        recent_orders: panel(recent)?.map(|p| p.items).unwrap_or_default(),
    })
}

/// Keep a panel's data, or log and drop it. An expired backend session
/// still ends the request.
fn panel<T>(result: std::result::Result<T, ApiError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Dashboard panel failed to load");
            Ok(None)
        }
    }
}
