//! Inventory alert report.
//!
//! Signs in as the admin named by `TW_ADMIN_EMAIL` / `TW_ADMIN_PASSWORD`,
//! walks every page of alerts, then signs out again.

use secrecy::SecretString;
use tidewater_api::{AlertQuery, CookieJar, InventoryAlert};
use tidewater_core::Email;

use super::{CommandError, client, required_env};

const PER_PAGE: u32 = 100;

/// Log every alert, unresolved only unless `all`.
pub async fn run(all: bool) -> Result<(), CommandError> {
    let api = client()?;
    let email = Email::parse(&required_env("TW_ADMIN_EMAIL")?)?;
    let password = SecretString::from(required_env("TW_ADMIN_PASSWORD")?);

    let mut jar = CookieJar::default();
    let mut session = api.session(&mut jar);
    let user = session.login(&email, &password).await?;
    if !user.role.is_admin() {
        if let Err(e) = session.logout().await {
            tracing::warn!(error = %e, "Logout failed");
        }
        return Err(CommandError::NotAdmin(user.email));
    }

    let alerts = collect(&mut session, all).await;
    if let Err(e) = session.logout().await {
        tracing::warn!(error = %e, "Logout failed");
    }
    let alerts = alerts?;

    if alerts.is_empty() {
        tracing::info!("No inventory alerts");
        return Ok(());
    }
    for alert in &alerts {
        tracing::info!("{}", describe(alert));
    }
    tracing::info!(count = alerts.len(), "Inventory alerts listed");
    Ok(())
}

async fn collect(
    session: &mut tidewater_api::ApiSession<'_>,
    all: bool,
) -> Result<Vec<InventoryAlert>, CommandError> {
    let mut alerts = Vec::new();
    let mut page = 1;
    loop {
        let query = AlertQuery {
            unresolved: (!all).then_some(1),
            alert_type: None,
            per_page: Some(PER_PAGE),
            page: Some(page),
        };
        let batch = session.inventory_alerts(&query).await?;
        let last_page = batch.pagination.last_page;
        alerts.extend(batch.items);
        if page >= last_page {
            return Ok(alerts);
        }
        page += 1;
    }
}

fn describe(alert: &InventoryAlert) -> String {
    let sku = alert
        .inventory
        .as_ref()
        .map_or("-", |inventory| inventory.sku_code());
    let state = if alert.is_resolved { "resolved" } else { "open" };
    format!(
        "#{} {} {} sku={} available={} threshold={}",
        alert.id,
        alert.alert_type.label(),
        state,
        sku,
        alert.current_quantity,
        alert.threshold_quantity,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_alert() {
        let alert: InventoryAlert = serde_json::from_str(
            r#"{"id":7,"inventory_id":3,"alert_type":"low_stock","threshold_quantity":5,
                "current_quantity":2,"is_resolved":false,
                "inventory":{"id":3,"product_sku_id":9,"quantity":4,"allocated_quantity":2,
                             "available_quantity":2,"safety_stock":5,
                             "product_sku":{"id":9,"sku_code":"TEE-M-BLK"}}}"#,
        )
        .unwrap();
        assert_eq!(
            describe(&alert),
            "#7 Low stock open sku=TEE-M-BLK available=2 threshold=5"
        );
    }
}
