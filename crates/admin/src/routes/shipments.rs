//! Shipment (fulfilment) route handlers.
//!
//! A shipment moves preparing → packed → shipped → delivered. Shipping is
//! the step where the backend deducts stock.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{Shipment, ShipmentQuery, TrackingInfo};
use tidewater_core::{ShipmentId, ShipmentItemId, ShipmentStatus, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{non_blank, redirect_with};
use crate::views::{PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 20;

/// Shipment list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ShipmentFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub shipment_number: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl ShipmentFilter {
    fn status(&self) -> Option<ShipmentStatus> {
        ShipmentStatus::from_wire(self.status.as_deref()?)
    }

    fn to_query(&self) -> ShipmentQuery {
        ShipmentQuery {
            status: self.status(),
            order_id: None,
            shipment_number: self.shipment_number.clone(),
            tracking_number: self.tracking_number.clone(),
            per_page: Some(PER_PAGE),
            page: self.page,
        }
    }
}

/// Shipment list template.
#[derive(Template, WebTemplate)]
#[template(path = "shipments/index.html")]
pub struct ShipmentsIndexTemplate {
    pub page: PageContext,
    pub shipments: Vec<Shipment>,
    pub statuses: Vec<SelectOption>,
    pub shipment_number: String,
    pub tracking_number: String,
    pub pager: Pager,
}

/// Shipment detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shipments/show.html")]
pub struct ShipmentShowTemplate {
    pub page: PageContext,
    pub shipment: Shipment,
    pub carrier: String,
    pub tracking_number: String,
    pub note: String,
}

/// Carrier and tracking number; both optional.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingForm {
    #[serde(default)]
    pub shipping_carrier: String,
    #[serde(default)]
    pub tracking_number: String,
}

impl TrackingForm {
    fn to_input(&self) -> TrackingInfo {
        TrackingInfo {
            shipping_carrier: non_blank(&self.shipping_carrier),
            tracking_number: non_blank(&self.tracking_number),
        }
    }
}

/// Free-text note.
#[derive(Debug, Default, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub note: String,
}

/// Pick form; carries the shipment so the redirect survives a failure.
#[derive(Debug, Default, Deserialize)]
pub struct PickForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub shipment_id: Option<ShipmentId>,
}

fn detail_path(id: ShipmentId) -> String {
    format!("/shipments/{id}")
}

/// Shipment list.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<ShipmentFilter>,
) -> Result<impl IntoResponse> {
    let shipments = backend.api().shipments(&filter.to_query()).await;
    let statuses = backend.api().shipment_statuses().await;
    backend.save().await?;
    let shipments = shipments?;

    let current = filter.status().map(|s| s.as_str());
    let statuses = match statuses {
        Ok(choices) if !choices.is_empty() => SelectOption::from_choices(&choices, current),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        _ => ShipmentStatus::ALL
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), current))
            .collect(),
    };

    Ok(ShipmentsIndexTemplate {
        page,
        statuses,
        pager: Pager::new(
            "/shipments",
            &shipments.pagination,
            &[
                ("status", current.map(str::to_string)),
                ("shipment_number", filter.shipment_number.clone()),
                ("tracking_number", filter.tracking_number.clone()),
            ],
        ),
        shipments: shipments.items,
        shipment_number: filter.shipment_number.unwrap_or_default(),
        tracking_number: filter.tracking_number.unwrap_or_default(),
    })
}

/// Shipment detail with the actions its status allows.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<ShipmentId>,
) -> Result<impl IntoResponse> {
    let result = backend.api().shipment(id).await;
    backend.save().await?;
    let shipment = result?;
    Ok(ShipmentShowTemplate {
        page,
        carrier: shipment.shipping_carrier.clone().unwrap_or_default(),
        tracking_number: shipment.tracking_number.clone().unwrap_or_default(),
        note: shipment.note.clone().unwrap_or_default(),
        shipment,
    })
}

/// Mark one shipment line as picked.
#[instrument(skip_all, fields(admin_id = %admin.id, item_id = %item))]
pub async fn pick_item(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(item): Path<ShipmentItemId>,
    Form(form): Form<PickForm>,
) -> Result<Response> {
    let result = backend.api().pick_item(item).await;
    backend.save().await?;
    let to = result
        .as_ref()
        .ok()
        .map(|picked| picked.shipment_id)
        .or(form.shipment_id)
        .map_or_else(|| "/shipments".to_string(), detail_path);
    let flash = Flash::from_result(result, "Item picked", "Could not pick the item")?;
    redirect_with(&backend, flash, &to).await
}

/// Mark every line as picked.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn pick_all(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
) -> Result<Response> {
    let result = backend.api().pick_all(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "All items picked", "Could not pick the items")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

/// Mark packed. The backend requires every line to be picked.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn pack(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
) -> Result<Response> {
    let result = backend.api().pack_shipment(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Shipment packed", "Could not pack the shipment")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

/// Hand the shipment to the carrier.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn ship(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
    Form(form): Form<TrackingForm>,
) -> Result<Response> {
    let result = backend.api().ship_shipment(id, &form.to_input()).await;
    backend.save().await?;
    if let Ok(shipment) = &result {
        tracing::info!(shipment_number = %shipment.shipment_number, "Shipment shipped");
    }
    let flash = Flash::from_result(result, "Shipment shipped", "Could not ship the shipment")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

/// Mark delivered.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn deliver(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
) -> Result<Response> {
    let result = backend.api().deliver_shipment(id).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Shipment delivered", "Could not mark the shipment delivered")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

/// Change carrier or tracking number.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn update_tracking(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
    Form(form): Form<TrackingForm>,
) -> Result<Response> {
    let result = backend.api().update_tracking(id, &form.to_input()).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Tracking updated", "Could not update tracking")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

/// Replace the shipment note.
#[instrument(skip_all, fields(admin_id = %admin.id, shipment_id = %id))]
pub async fn update_note(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<ShipmentId>,
    Form(form): Form<NoteForm>,
) -> Result<Response> {
    let result = backend.api().update_shipment_note(id, form.note.trim()).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Note saved", "Could not save the note")?;
    redirect_with(&backend, flash, &detail_path(id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_form_blank_fields_are_omitted() {
        let form = TrackingForm {
            shipping_carrier: " Yamato ".to_string(),
            tracking_number: "  ".to_string(),
        };
        let input = form.to_input();
        assert_eq!(input.shipping_carrier.as_deref(), Some("Yamato"));
        assert!(input.tracking_number.is_none());
    }

    #[test]
    fn test_filter_to_query() {
        let filter = ShipmentFilter {
            status: Some("packed".to_string()),
            tracking_number: Some("1234-5678".to_string()),
            ..ShipmentFilter::default()
        };
        let query = filter.to_query();
        assert_eq!(query.status, Some(ShipmentStatus::Packed));
        assert_eq!(query.tracking_number.as_deref(), Some("1234-5678"));
        assert_eq!(query.per_page, Some(PER_PAGE));
    }

    #[test]
    fn test_detail_path() {
        assert_eq!(detail_path(ShipmentId::new(12)), "/shipments/12");
    }
}
