//! Inventory route handlers.
//!
//! Stock levels only change through the backend's ledger operations
//! (adjust, receive); this console never writes quantities directly.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tidewater_api::{
    Inventory, InventoryQuery, InventoryTransaction, NewInventory, ProductQuery, StockAdjustment,
    StockFilter, StockReceipt, TransactionQuery,
};
use tidewater_core::{InventoryEventType, InventoryId, SkuId, empty_as_none};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::flash::Flash;
use crate::middleware::{Backend, RequireAdmin};
use crate::routes::{form_errors, non_blank, parse_optional, redirect_with};
use crate::views::{PageContext, Pager, SelectOption};

const PER_PAGE: u32 = 20;
const TRANSACTIONS_PER_PAGE: u32 = 20;

/// Products scanned when building the SKU picker.
const SKU_PICKER_PRODUCTS: u32 = 100;

/// Inventory list filters.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sku_code: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl InventoryFilter {
    fn status(&self) -> Option<StockFilter> {
        let wanted = self.status.as_deref()?;
        StockFilter::ALL.into_iter().find(|s| s.as_str() == wanted)
    }

    fn to_query(&self) -> InventoryQuery {
        InventoryQuery {
            status: self.status(),
            sku_code: self.sku_code.clone(),
            per_page: Some(PER_PAGE),
            page: self.page,
        }
    }
}

/// Transaction history filters on the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
}

impl TransactionFilter {
    fn event_type(&self) -> Option<InventoryEventType> {
        let wanted = self.event_type.as_deref()?;
        InventoryEventType::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
    }

    fn to_query(&self) -> TransactionQuery {
        TransactionQuery {
            event_type: self.event_type(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            per_page: Some(TRANSACTIONS_PER_PAGE),
            page: self.page,
        }
    }
}

/// Inventory list template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/index.html")]
pub struct InventoriesIndexTemplate {
    pub page: PageContext,
    pub inventories: Vec<Inventory>,
    pub statuses: Vec<SelectOption>,
    pub sku_code: String,
    pub pager: Pager,
}

/// Inventory detail template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/show.html")]
pub struct InventoryShowTemplate {
    pub page: PageContext,
    pub inventory: Inventory,
    pub transactions: Vec<InventoryTransaction>,
    pub event_types: Vec<SelectOption>,
    pub start_date: String,
    pub end_date: String,
    pub pager: Pager,
}

/// New stock record form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewInventoryForm {
    #[serde(default)]
    pub product_sku_id: String,
    #[serde(default)]
    pub initial_quantity: String,
    #[serde(default)]
    pub safety_stock: String,
}

impl NewInventoryForm {
    fn to_input(&self) -> std::result::Result<NewInventory, Vec<String>> {
        let mut errors = Vec::new();
        let sku = parse_optional::<i64>(&self.product_sku_id, "SKU", &mut errors);
        if self.product_sku_id.trim().is_empty() {
            errors.push("Choose a SKU".to_string());
        }
        let initial_quantity =
            parse_optional::<i64>(&self.initial_quantity, "Initial quantity", &mut errors);
        let safety_stock = parse_optional::<i64>(&self.safety_stock, "Safety stock", &mut errors);
        if initial_quantity.is_some_and(|q| q < 0) {
            errors.push("Initial quantity cannot be negative".to_string());
        }
        if safety_stock.is_some_and(|q| q < 0) {
            errors.push("Safety stock cannot be negative".to_string());
        }

        match sku {
            Some(sku) if errors.is_empty() => Ok(NewInventory {
                product_sku_id: SkuId::new(sku),
                initial_quantity,
                safety_stock,
            }),
            _ => Err(errors),
        }
    }
}

/// New stock record template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/new.html")]
pub struct NewInventoryTemplate {
    pub page: PageContext,
    pub form: NewInventoryForm,
    pub skus: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Quantity and note posted from the adjust page.
#[derive(Debug, Default, Deserialize)]
pub struct StockForm {
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub note: String,
}

impl StockForm {
    /// A signed, non-zero change.
    fn adjustment(&self, sku: SkuId) -> std::result::Result<StockAdjustment, String> {
        let change = self
            .quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| "Quantity change must be a whole number".to_string())?;
        if change == 0 {
            return Err("Quantity change cannot be zero".to_string());
        }
        Ok(StockAdjustment {
            product_sku_id: sku,
            quantity_change: change,
            note: non_blank(&self.note),
        })
    }

    /// A positive inbound quantity.
    fn receipt(&self, sku: SkuId) -> std::result::Result<StockReceipt, String> {
        let quantity = self
            .quantity
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| "Received quantity must be at least 1".to_string())?;
        Ok(StockReceipt {
            product_sku_id: sku,
            quantity,
            note: non_blank(&self.note),
        })
    }
}

/// Adjust/receive page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/adjust.html")]
pub struct AdjustTemplate {
    pub page: PageContext,
    pub inventory: Inventory,
}

/// Safety stock form.
#[derive(Debug, Default, Deserialize)]
pub struct SafetyStockForm {
    #[serde(default)]
    pub safety_stock: String,
}

/// Safety stock page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventories/safety_stock.html")]
pub struct SafetyStockTemplate {
    pub page: PageContext,
    pub inventory: Inventory,
}

async fn sku_options(backend: &mut Backend, current: &str) -> Result<Vec<SelectOption>> {
    let products = backend
        .api()
        .products(&ProductQuery {
            per_page: Some(SKU_PICKER_PRODUCTS),
            ..ProductQuery::default()
        })
        .await;
    match products {
        Ok(page) => Ok(page
            .items
            .iter()
            .flat_map(|product| {
                product.skus.iter().map(move |sku| {
                    SelectOption::new(
                        sku.id.to_string(),
                        format!("{} / {} ({})", product.name, sku.variant_label(), sku.sku_code),
                        Some(current),
                    )
                })
            })
            .collect()),
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load SKUs");
            Ok(Vec::new())
        }
    }
}

async fn render_new(
    backend: &mut Backend,
    page: PageContext,
    form: NewInventoryForm,
    errors: Vec<String>,
) -> Result<Response> {
    let skus = sku_options(backend, &form.product_sku_id).await?;
    backend.save().await?;
    Ok(NewInventoryTemplate {
        page,
        form,
        skus,
        errors,
    }
    .into_response())
}

/// Fetch one stock record, saving rotated cookies first.
async fn load(backend: &mut Backend, id: InventoryId) -> Result<Inventory> {
    let result = backend.api().inventory(id).await;
    backend.save().await?;
    Ok(result?)
}

/// Stock list.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse> {
    let result = backend.api().inventories(&filter.to_query()).await;
    backend.save().await?;
    let inventories = result?;

    let current = filter.status().map(|s| s.as_str());
    Ok(InventoriesIndexTemplate {
        page,
        statuses: StockFilter::ALL
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), current))
            .collect(),
        pager: Pager::new(
            "/inventories",
            &inventories.pagination,
            &[
                ("status", current.map(str::to_string)),
                ("sku_code", filter.sku_code.clone()),
            ],
        ),
        inventories: inventories.items,
        sku_code: filter.sku_code.unwrap_or_default(),
    })
}

/// New stock record form.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
) -> Result<Response> {
    let form = NewInventoryForm {
        initial_quantity: "0".to_string(),
        safety_stock: "0".to_string(),
        ..NewInventoryForm::default()
    };
    render_new(&mut backend, page, form, Vec::new()).await
}

/// Create a stock record for a SKU.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Form(form): Form<NewInventoryForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return render_new(&mut backend, page, form, errors).await,
    };

    let result = backend.api().create_inventory(&input).await;
    backend.save().await?;
    match result {
        Ok(inventory) => {
            tracing::info!(inventory_id = %inventory.id, "Stock record created");
            redirect_with(
                &backend,
                Flash::notice("Stock record created"),
                &format!("/inventories/{}", inventory.id),
            )
            .await
        }
        Err(e) if e.is_unauthenticated() => Err(e.into()),
        Err(e) => {
            let errors = form_errors(&e, "Could not create the stock record");
            render_new(&mut backend, page, form, errors).await
        }
    }
}

/// Stock record with its transaction history.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<InventoryId>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse> {
    let inventory = backend.api().inventory(id).await;
    let transactions = backend
        .api()
        .inventory_transactions(id, &filter.to_query())
        .await;
    backend.save().await?;
    let inventory = inventory?;
    let transactions = transactions?;

    let current = filter.event_type().map(|e| e.as_str());
    Ok(InventoryShowTemplate {
        page,
        event_types: InventoryEventType::ALL
            .iter()
            .map(|e| SelectOption::new(e.as_str(), e.label(), current))
            .collect(),
        pager: Pager::new(
            &format!("/inventories/{id}"),
            &transactions.pagination,
            &[
                ("event_type", current.map(str::to_string)),
                ("start_date", filter.start_date.clone()),
                ("end_date", filter.end_date.clone()),
            ],
        ),
        inventory,
        transactions: transactions.items,
        start_date: filter.start_date.unwrap_or_default(),
        end_date: filter.end_date.unwrap_or_default(),
    })
}

/// Adjust/receive form.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn adjust_page(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<InventoryId>,
) -> Result<impl IntoResponse> {
    let inventory = load(&mut backend, id).await?;
    Ok(AdjustTemplate { page, inventory })
}

/// Apply a signed stock adjustment.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn adjust(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<InventoryId>,
    Form(form): Form<StockForm>,
) -> Result<Response> {
    let inventory = load(&mut backend, id).await?;
    let input = match form.adjustment(inventory.product_sku_id) {
        Ok(input) => input,
        Err(message) => {
            return redirect_with(&backend, Flash::error(message), &format!("/inventories/{id}/adjust"))
                .await;
        }
    };

    let result = backend.api().adjust_stock(&input).await;
    backend.save().await?;
    let ok = result.is_ok();
    let flash = Flash::from_result(result, "Stock adjusted", "Could not adjust stock")?;
    let to = if ok {
        format!("/inventories/{id}")
    } else {
        format!("/inventories/{id}/adjust")
    };
    redirect_with(&backend, flash, &to).await
}

/// Record an inbound receipt.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn receive(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<InventoryId>,
    Form(form): Form<StockForm>,
) -> Result<Response> {
    let inventory = load(&mut backend, id).await?;
    let input = match form.receipt(inventory.product_sku_id) {
        Ok(input) => input,
        Err(message) => {
            return redirect_with(&backend, Flash::error(message), &format!("/inventories/{id}/adjust"))
                .await;
        }
    };

    let result = backend.api().receive_stock(&input).await;
    backend.save().await?;
    let ok = result.is_ok();
    let flash = Flash::from_result(result, "Stock received", "Could not receive stock")?;
    let to = if ok {
        format!("/inventories/{id}")
    } else {
        format!("/inventories/{id}/adjust")
    };
    redirect_with(&backend, flash, &to).await
}

/// Safety stock form.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn safety_stock_page(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    page: PageContext,
    Path(id): Path<InventoryId>,
) -> Result<impl IntoResponse> {
    let inventory = load(&mut backend, id).await?;
    Ok(SafetyStockTemplate { page, inventory })
}

/// Update the safety stock level.
#[instrument(skip_all, fields(admin_id = %admin.id, inventory_id = %id))]
pub async fn update_safety_stock(
    RequireAdmin(admin): RequireAdmin,
    mut backend: Backend,
    Path(id): Path<InventoryId>,
    Form(form): Form<SafetyStockForm>,
) -> Result<Response> {
    let Some(level) = parse_safety_stock(&form.safety_stock) else {
        return redirect_with(
            &backend,
            Flash::error("Safety stock must be zero or more"),
            &format!("/inventories/{id}/safety-stock"),
        )
        .await;
    };

    let result = backend.api().update_safety_stock(id, level).await;
    backend.save().await?;
    let flash = Flash::from_result(result, "Safety stock updated", "Could not update safety stock")?;
    redirect_with(&backend, flash, &format!("/inventories/{id}")).await
}

fn parse_safety_stock(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stock(quantity: &str) -> StockForm {
        StockForm {
            quantity: quantity.to_string(),
            note: " cycle count ".to_string(),
        }
    }

    #[test]
    fn test_adjustment_is_signed_and_non_zero() {
        let sku = SkuId::new(9);
        let input = stock("-3").adjustment(sku).unwrap();
        assert_eq!(input.quantity_change, -3);
        assert_eq!(input.note.as_deref(), Some("cycle count"));
        assert!(stock("0").adjustment(sku).is_err());
        assert!(stock("two").adjustment(sku).is_err());
    }

    #[test]
    fn test_receipt_must_be_positive() {
        let sku = SkuId::new(9);
        assert_eq!(stock("12").receipt(sku).unwrap().quantity, 12);
        assert!(stock("0").receipt(sku).is_err());
        assert!(stock("-4").receipt(sku).is_err());
    }

    #[test]
    fn test_safety_stock_parsing() {
        assert_eq!(parse_safety_stock(" 5 "), Some(5));
        assert_eq!(parse_safety_stock("0"), Some(0));
        assert_eq!(parse_safety_stock("-1"), None);
        assert_eq!(parse_safety_stock(""), None);
    }

    #[test]
    fn test_new_inventory_form() {
        let form = NewInventoryForm {
            product_sku_id: "14".to_string(),
            initial_quantity: "30".to_string(),
            safety_stock: "5".to_string(),
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.product_sku_id, SkuId::new(14));
        assert_eq!(input.initial_quantity, Some(30));

        let missing = NewInventoryForm {
            safety_stock: "-2".to_string(),
            ..NewInventoryForm::default()
        };
        assert_eq!(
            missing.to_input().unwrap_err(),
            vec![
                "Choose a SKU".to_string(),
                "Safety stock cannot be negative".to_string(),
            ]
        );
    }

    #[test]
    fn test_filters_ignore_unknown_values() {
        let filter = InventoryFilter {
            status: Some("low_stock".to_string()),
            ..InventoryFilter::default()
        };
        assert_eq!(filter.to_query().status, Some(StockFilter::LowStock));

        let filter = TransactionFilter {
            event_type: Some("teleport".to_string()),
            ..TransactionFilter::default()
        };
        assert!(filter.to_query().event_type.is_none());
    }
}
