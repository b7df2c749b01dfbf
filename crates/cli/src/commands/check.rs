//! Backend reachability check.

use super::{CommandError, client};

/// Fetch `/sanctum/csrf-cookie` and report the outcome.
pub async fn run() -> Result<(), CommandError> {
    let api = client()?;
    api.ping().await?;
    tracing::info!(backend = %api.base_url(), "Backend reachable");
    Ok(())
}
