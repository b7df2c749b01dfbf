//! Backend API errors.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Human-readable message extracted from the body, if any.
        message: Option<String>,
        /// The body's `error` key on its own.
        error: Option<String>,
        /// Per-field validation messages (Laravel `errors` object).
        field_errors: Vec<(String, String)>,
    },

    /// A success response lacked its envelope key (e.g. `product`).
    #[error("Response missing field '{0}'")]
    MissingField(&'static str),
}

impl ApiError {
    /// Build a `Status` error from a non-success response body.
    ///
    /// The message is taken from `message`, then `error`, then the first
    /// entry of the `errors` object.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let json = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
        let field_errors = field_errors(&json);

        let error = non_empty_str(json.get("error"));
        let message = non_empty_str(json.get("message"))
            .or_else(|| error.clone())
            .or_else(|| field_errors.first().map(|(_, msg)| msg.clone()));

        Self::Status {
            status,
            message,
            error,
            field_errors,
        }
    }

    /// Message to show the visitor, falling back to `default`.
    #[must_use]
    pub fn user_message(&self, default: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => default.to_string(),
        }
    }

    /// Like [`user_message`](Self::user_message), but the body's `error` key
    /// wins over `message`. Cart endpoints put the specific reason (stock
    /// shortfall, inactive SKU) in `error`.
    #[must_use]
    pub fn error_first_message(&self, default: &str) -> String {
        match self {
            Self::Status {
                error: Some(error), ..
            } => error.clone(),
            _ => self.user_message(default),
        }
    }

    /// HTTP status returned by the backend, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the backend session is missing or expired (401, or 419 for a
    /// stale CSRF token).
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        self.status()
            .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s.as_u16() == 419)
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Validation messages for one field.
    #[must_use]
    pub fn field_errors(&self, field: &str) -> Vec<&str> {
        match self {
            Self::Status { field_errors, .. } => field_errors
                .iter()
                .filter(|(name, _)| name == field)
                .map(|(_, msg)| msg.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every validation message, in the order the backend listed them.
    #[must_use]
    pub fn field_messages(&self) -> Vec<String> {
        match self {
            Self::Status { field_errors, .. } => {
                field_errors.iter().map(|(_, msg)| msg.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Flatten Laravel's `{"errors": {"field": ["msg", ...]}}` into pairs.
fn field_errors(json: &Value) -> Vec<(String, String)> {
    let Some(errors) = json.get("errors") else {
        return Vec::new();
    };

    match errors {
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, messages)| {
                let messages: Vec<String> = match messages {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                messages.into_iter().map(move |msg| (field.clone(), msg))
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|msg| (String::new(), msg.to_string()))
            .collect(),
        Value::String(s) => vec![(String::new(), s.clone())],
        _ => Vec::new(),
    }
}
