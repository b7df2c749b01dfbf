//! Order management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{
    ApiError, Choice, NewOrder, NewShipment, Order, OrderLine, OrderQuery, ShipmentLine,
};
use tidewater_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, SkuId, empty_as_none, parse_pair_list,
};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{form_errors, non_blank, redirect_with};
use crate::views::{PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 20;

/// Order list filters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub order_number: Option<String>,
    /// `YYYY-MM-DD`, passed through to the backend.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<String>,
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
            user_id: None,
            order_number: self.order_number.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            per_page: Some(PER_PAGE),
            page: self.page,
        }
    }
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub statuses: Vec<SelectOption>,
    pub order_number: String,
    pub start_date: String,
    pub end_date: String,
    pub pager: Pager,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: Order,
    pub statuses: Vec<SelectOption>,
    /// Pre-filled `order_item_id:quantity` lines for the shipment form.
    pub shipment_lines: String,
}

/// Order created on behalf of a customer.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewOrderForm {
    #[serde(default)]
    pub address_id: String,
    #[serde(default)]
    pub payment_method: String,
    /// `sku_id:quantity` pairs.
    #[serde(default)]
    pub items: String,
    #[serde(default)]
    pub note: String,
}

impl NewOrderForm {
    fn to_input(&self) -> std::result::Result<NewOrder, Vec<String>> {
        let mut errors = Vec::new();
        let address_id = self.address_id.trim().parse::<i64>().ok();
        if address_id.is_none() {
            errors.push("Address ID is required".to_string());
        }
        if self.payment_method.trim().is_empty() {
            errors.push("Choose a payment method".to_string());
        }
        let items = match parse_pair_list::<SkuId>(&self.items) {
            Ok(pairs) => pairs,
            Err(e) => {
                errors.push(format!("Items: {e}"));
                Vec::new()
            }
        };

        match address_id {
            Some(address_id) if errors.is_empty() => Ok(NewOrder {
                address_id: AddressId::new(address_id),
                payment_method: self.payment_method.trim().to_string(),
                items: items
                    .into_iter()
                    .map(|(product_sku_id, quantity)| OrderLine {
                        product_sku_id,
                        quantity,
                    })
                    .collect(),
                note: non_blank(&self.note),
            }),
            _ => Err(errors),
        }
    }
}

/// New order template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/new.html")]
pub struct NewOrderTemplate {
    pub page: PageContext,
    pub form: NewOrderForm,
    pub payment_methods: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Partial shipment form.
#[derive(Debug, Deserialize)]
pub struct ShipmentForm {
    /// `order_item_id:quantity` pairs.
    #[serde(default)]
    pub items: String,
}

impl ShipmentForm {
    fn to_input(&self, order_id: OrderId) -> std::result::Result<NewShipment, String> {
        let pairs =
            parse_pair_list::<OrderItemId>(&self.items).map_err(|e| format!("Items: {e}"))?;
        Ok(NewShipment {
            order_id,
            items: pairs
                .into_iter()
                .map(|(order_item_id, quantity)| ShipmentLine {
                    order_item_id,
                    quantity,
                })
                .collect(),
        })
    }
}

/// One `id:quantity` line per item still waiting to ship.
fn unshipped_lines(order: &Order) -> String {
    order
        .unshipped_items()
        .iter()
        .filter_map(|item| {
            item.unshipped_quantity
                .map(|quantity| format!("{}:{quantity}", item.id))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Backend choices, or the built-in list when the backend has none.
fn status_options(
    choices: std::result::Result<Vec<Choice>, ApiError>,
    current: Option<&str>,
) -> Result<Vec<SelectOption>> {
    match choices {
        Ok(choices) if !choices.is_empty() => Ok(SelectOption::from_choices(&choices, current)),
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        other => {
            if let Err(e) = other {
                tracing::warn!(error = %e, "Failed to load order statuses");
            }
            Ok(OrderStatus::ALL
                .iter()
                .map(|s| SelectOption::new(s.as_str(), s.label(), current))
                .collect())
        }
    }
}

async fn render_new(
    backend: &mut Backend,
    page: PageContext,
    form: NewOrderForm,
    errors: Vec<String>,
) -> Result<Response> {
    let methods = backend.api().payment_methods().await;
    backend.save().await?;
    let payment_methods = match methods {
        Ok(choices) => SelectOption::from_choices(&choices, Some(form.payment_method.as_str())),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load payment methods");
            Vec::new()
        }
    };
    Ok(NewOrderTemplate {
        page,
        form,
        payment_methods,
        errors,
    }
    .into_response())
}

/// All orders with filters.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse> {
    let orders = backend.api().admin_orders(&filter.to_query()).await;
    let statuses = backend.api().order_statuses().await;
    backend.save().await?;
    let orders = orders?;

    let current = filter.status().map(|s| s.as_str());
    Ok(OrdersIndexTemplate {
        page,
        statuses: status_options(statuses, current)?,
        pager: Pager::new(
            "/orders",
            &orders.pagination,
            &[
                ("status", current.map(str::to_string)),
                ("order_number", filter.order_number.clone()),
                ("start_date", filter.start_date.clone()),
                ("end_date", filter.end_date.clone()),
            ],
        ),
        orders: orders.items,
        order_number: filter.order_number.unwrap_or_default(),
        start_date: filter.start_date.unwrap_or_default(),
        end_date: filter.end_date.unwrap_or_default(),
    })
}

/// New order form.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    render_new(&mut backend, page, NewOrderForm::default(), Vec::new()).await
}

/// Place an order on behalf of a customer.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<NewOrderForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return render_new(&mut backend, page, form, errors).await,
    };

    let result = backend.api().create_order(&input).await;
    backend.save().await?;
    match result {
        Ok(order) => {
            tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order created");
            redirect_with(
                &backend,
                Flash::notice(format!("Order {} created", order.order_number)),
                &format!("/orders/{}", order.id),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not create the order");
            render_new(&mut backend, page, form, errors).await
        }
    }
}

/// Order detail with status controls and the shipment form.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = backend.api().order(id).await;
    let statuses = backend.api().order_statuses().await;
    backend.save().await?;
    let order = order?;

    Ok(OrderShowTemplate {
        page,
        statuses: status_options(statuses, Some(order.status.as_str()))?,
        shipment_lines: unshipped_lines(&order),
        order,
    })
}

/// Set an order's status. The backend decides whether the transition is allowed.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let to = format!("/orders/{id}");
    let Some(status) = OrderStatus::from_wire(form.status.trim()) else {
        return redirect_with(&backend, Flash::error("Choose a valid status"), &to).await;
    };

    let result = backend.api().update_order_status(id, status).await;
    backend.save().await?;
    let notice = format!("Status changed to {}", status.label());
    let flash = Flash::from_result(result, &notice, "Could not change the status")?;
    redirect_with(&backend, flash, &to).await
}

/// Cancel an order.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn cancel(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let result = backend.api().cancel_order(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Order cancelled", "Could not cancel the order")?;
    redirect_with(&backend, flash, &format!("/orders/{id}")).await
}

/// Complete a delivered order.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn complete(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let result = backend.api().complete_order(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Order completed", "Could not complete the order")?;
    redirect_with(&backend, flash, &format!("/orders/{id}")).await
}

/// Create a (possibly partial) shipment for an order.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn create_shipment(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<OrderId>,
    Form(form): Form<ShipmentForm>,
) -> Result<Response> {
    let input = match form.to_input(id) {
        Ok(input) => input,
        Err(message) => {
            return redirect_with(&backend, Flash::error(message), &format!("/orders/{id}")).await;
        }
    };

    let result = backend.api().create_shipment(&input).await;
    backend.save().await?;
    match result {
        Ok(shipment) => {
            tracing::info!(shipment_id = %shipment.id, "Shipment created");
            redirect_with(
                &backend,
                Flash::notice(format!("Shipment {} created", shipment.shipment_number)),
                &format!("/shipments/{}", shipment.id),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Shipment creation failed");
            let flash = Flash::error(e.user_message("Could not create the shipment"));
            redirect_with(&backend, flash, &format!("/orders/{id}")).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_new_order_form_parses_item_pairs() {
        let form = NewOrderForm {
            address_id: "3".to_string(),
            payment_method: "credit_card".to_string(),
            items: "14:2,\n15:1".to_string(),
            note: String::new(),
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.address_id, AddressId::new(3));
        assert_eq!(input.items.len(), 2);
        assert_eq!(input.items[0].product_sku_id, SkuId::new(14));
        assert_eq!(input.items[0].quantity, 2);
        assert!(input.note.is_none());
    }

    #[test]
    fn test_new_order_form_reports_every_problem() {
        let form = NewOrderForm {
            items: "14".to_string(),
            ..NewOrderForm::default()
        };
        let errors = form.to_input().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Address ID is required".to_string(),
                "Choose a payment method".to_string(),
                "Items: entry '14' must look like id:quantity".to_string(),
            ]
        );
    }

    #[test]
    fn test_shipment_form() {
        let form = ShipmentForm {
            items: "101:1\n102:2".to_string(),
        };
        let input = form.to_input(OrderId::new(8)).unwrap();
        assert_eq!(input.order_id, OrderId::new(8));
        assert_eq!(input.items[1].order_item_id, OrderItemId::new(102));

        let empty = ShipmentForm {
            items: " ".to_string(),
        };
        assert!(empty.to_input(OrderId::new(8)).is_err());
    }

    #[test]
    fn test_status_options_fall_back_to_builtin_list() {
        let failed = Err(ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, ""));
        let options = status_options(failed, Some("shipped")).unwrap();
        assert_eq!(options.len(), OrderStatus::ALL.len());
        assert!(options.iter().any(|o| o.value == "shipped" && o.selected));

        let expired = Err(ApiError::from_response(StatusCode::from_u16(419).unwrap(), ""));
        assert!(status_options(expired, None).is_err());
    }

    #[test]
    fn test_filter_ignores_unknown_status() {
        let filter = OrderFilter {
            status: Some("lost".to_string()),
            order_number: Some("ORD-1".to_string()),
            ..OrderFilter::default()
        };
        let query = filter.to_query();
        assert!(query.status.is_none());
        assert_eq!(query.order_number.as_deref(), Some("ORD-1"));
    }
}
