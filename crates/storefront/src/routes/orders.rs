//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tidewater_api::{Order, OrderQuery};
use tidewater_core::{OrderId, OrderStatus, empty_as_none};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::{Flash, set_flash};
use crate::middleware::{Backend, RequireAuth};
use crate::views::{AssetUrls, PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 10;

/// Order list filters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl OrderFilter {
    fn status(&self) -> Option<OrderStatus> {
        OrderStatus::from_wire(self.status.as_deref()?)
    }

    fn to_query(&self) -> OrderQuery {
        OrderQuery {
            status: self.status(),
            per_page: Some(PER_PAGE),
            page: self.page,
            ..OrderQuery::default()
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub statuses: Vec<SelectOption>,
    pub pager: Pager,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: Order,
    pub assets: AssetUrls,
}

/// List the customer's orders, optionally by status.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse> {
    let orders = backend.api().my_orders(&filter.to_query()).await;
    let statuses = backend.api().order_statuses().await;
    backend.save().await?;
    let orders = orders?;

    let current = filter.status().map(|s| s.as_str());
    let statuses = match statuses {
        Ok(choices) => SelectOption::from_choices(&choices, current),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load order statuses");
            OrderStatus::ALL
                .iter()
                .map(|s| SelectOption::new(s.as_str(), s.label(), current))
                .collect()
        }
    };

    let status_filter = filter.status().map(|s| s.as_str().to_string());
    Ok(OrdersIndexTemplate {
        page,
        pager: Pager::new("/orders", &orders.pagination, &[("status", status_filter)]),
        orders: orders.items,
        statuses,
    })
}

/// Order detail with items and shipments.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let result = backend.api().order(id).await;
    backend.save().await?;
    let order = result?;

    if order.user_id != user.id {
        return Err(AppError::NotFound(format!("Order {id}")));
    }

    Ok(OrderShowTemplate {
        page,
        order,
        assets: AssetUrls::new(backend.client().clone()),
    })
}

/// Cancel an order. Only pending and confirmed orders can be cancelled.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    mut backend: Backend,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let back = format!("/orders/{id}");

    let order = backend.api().order(id).await;
    let order = match order {
        Ok(order) => order,
        Err(e) => {
            backend.save().await?;
            return Err(e.into());
        }
    };
    if !order.status.is_cancellable() {
        backend.save().await?;
        set_flash(
            backend.session(),
            Flash::error("This order can no longer be cancelled"),
        )
        .await?;
        return Ok(Redirect::to(&back).into_response());
    }

    let result = backend.api().cancel_order(id).await;
    backend.save().await?;

    match result {
        Ok(order) => {
            tracing::info!(order_number = %order.order_number, "Order cancelled");
            set_flash(
                backend.session(),
                Flash::notice(format!("Order {} has been cancelled", order.order_number)),
            )
            .await?;
        }
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            set_flash(
                backend.session(),
                Flash::error(e.user_message("Could not cancel the order")),
            )
            .await?;
        }
    }
    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_filter(query: &str) -> OrderFilter {
        let uri: axum::http::Uri = format!("/orders?{query}").parse().unwrap();
        Query::<OrderFilter>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_status_filter() {
        let query = parse_filter("status=shipped&page=2").to_query();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(PER_PAGE));
    }

    #[test]
    fn test_blank_or_unknown_status_is_ignored() {
        assert!(parse_filter("status=&page=").to_query().status.is_none());
        assert!(parse_filter("status=on_hold").to_query().status.is_none());
    }
}
