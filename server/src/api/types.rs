//! Shared API types
//!
//! Error responses used by every endpoint. Bodies are
//! `{"error": <kind>, "code": <CODE>, "message": <text>}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationError;

use crate::data::DataError;
use crate::table::TableError;

/// Request failed validation before any query ran
pub const CODE_INVALID_REQUEST: &str = "INVALID_REQUEST";
/// Query referenced columns or match modes it cannot use
pub const CODE_INVALID_QUERY: &str = "INVALID_QUERY";
/// Export ran but produced no file
pub const CODE_EXPORT_FAILED: &str = "EXPORT_FAILED";

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Validation failures carry the validator's message, or its code
    pub fn invalid_request(e: ValidationError) -> Self {
        let message = e
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Validation failed: {}", e.code));
        Self::bad_request(CODE_INVALID_REQUEST, message)
    }

    pub fn from_table(e: TableError) -> Self {
        if e.is_client_error() {
            tracing::debug!(error = %e, code = e.code(), "Rejected table query");
            return Self::bad_request(CODE_INVALID_QUERY, e.to_string());
        }
        tracing::error!(error = %e, "Table source error");
        Self::internal("Database operation failed")
    }

    pub fn from_data(e: DataError) -> Self {
        match e {
            DataError::Table(e) => Self::from_table(e),
            e if e.is_transient() => {
                tracing::warn!(error = %e, backend = e.backend(), "Database unavailable");
                Self::service_unavailable("Database temporarily unavailable")
            }
            e => {
                tracing::error!(error = %e, backend = e.backend(), "Data error");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        Self::from_data(e)
    }
}

impl From<TableError> for ApiError {
    fn from(e: TableError) -> Self {
        Self::from_table(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
