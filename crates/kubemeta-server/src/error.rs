//! Error types for the HTTP handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Errors returned to HTTP clients as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter is absent or empty.
    #[error("Missing required query parameter '{0}'")]
    MissingParameter(&'static str),

    /// A query parameter could not be parsed.
    #[error("Invalid value '{value}' for query parameter '{name}'")]
    InvalidParameter { name: &'static str, value: String },

    /// The request domain is pinned to another namespace.
    #[error("Namespace '{requested}' is not allowed for this domain")]
    NamespaceMismatch { requested: String },

    /// The Kubernetes API call failed. Carries the full error chain.
    #[error("Exception. Details: {0}.")]
    Upstream(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Request validation (missing/invalid parameter, namespace mismatch): 400
    /// - Upstream failure: 500
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::InvalidParameter { .. }
            | Self::NamespaceMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Upstream request failed");
        } else {
            debug!(error = %self, "Rejected request");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::MissingParameter("pod").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidParameter {
                name: "tail_lines",
                value: "ten".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NamespaceMismatch {
                requested: "staging".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Upstream("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("Failed to list pods");
        let api_error = ApiError::from(err);
        assert_eq!(
            api_error.to_string(),
            "Exception. Details: Failed to list pods: connection refused."
        );
    }
}
