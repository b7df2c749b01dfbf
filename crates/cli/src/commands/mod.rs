//! Subcommand implementations.

pub mod alerts;
pub mod check;

use tidewater_admin::config::{AdminConfig, ConfigError};
use tidewater_api::{ApiClient, ApiError};
use tidewater_core::EmailError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid admin email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("{0} is not an admin account")]
    NotAdmin(String),
}

/// Build a backend client from the admin console's environment.
fn client() -> Result<ApiClient, CommandError> {
    dotenvy::dotenv().ok();
    let config = AdminConfig::from_env()?;
    tracing::debug!(backend = %config.backend_url, "Using backend");
    Ok(ApiClient::new(&config.api_config())?)
}

fn required_env(key: &'static str) -> Result<String, CommandError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(CommandError::MissingEnvVar(key))
}
