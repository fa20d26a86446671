use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Caller input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A provider credential is not configured.
    #[error("{0}")]
    Config(String),

    /// The provider call failed: bad status, transport error, timeout or unusable body.
    #[error("{message}")]
    Upstream {
        message: String,
        payload: Option<Value>,
    },
}

impl AppError {
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream {
            message: message.into(),
            payload: None,
        }
    }

    pub fn upstream_with_payload(message: impl Into<String>, payload: Value) -> Self {
        AppError::Upstream {
            message: message.into(),
            payload: Some(payload),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("provider request timed out: {err}")
        } else {
            format!("provider request failed: {err}")
        };
        AppError::upstream(message)
    }
}

/// An [`AppError`] raised while serving a particular route.
///
/// Validation failures go back to the caller as-is. Everything else is
/// reported under the route's summary, with the underlying message in `detail`.
#[derive(Debug)]
pub struct RouteError {
    pub route: String,
    pub summary: &'static str,
    pub error: AppError,
}

impl RouteError {
    pub fn new(route: impl Into<String>, summary: &'static str, error: AppError) -> Self {
        Self {
            route: route.into(),
            summary,
            error,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self.error {
            AppError::Validation(message) => {
                tracing::warn!(route = %self.route, %message, "rejected request");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::Config(message) => {
                tracing::error!(route = %self.route, %message, "provider not configured");
                server_error(self.summary, message)
            }
            AppError::Upstream { message, payload } => {
                tracing::error!(
                    route = %self.route,
                    %message,
                    payload = ?payload,
                    "provider call failed"
                );
                server_error(self.summary, message)
            }
        }
    }
}

fn server_error(summary: &str, detail: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": summary, "detail": detail })),
    )
        .into_response()
}
