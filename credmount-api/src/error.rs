//! Standardized error handling for the JSON endpoints
//!
//! The HTML form reports failures inside the page itself; everything else
//! answers with an [`ErrorResponse`] body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard API error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for programmatic handling
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// RFC 3339 time the error was produced
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// API error types with standardized responses
#[derive(Debug)]
pub enum ApiError {
    /// 500 Internal Server Error
    Internal(String),

    /// 404 Not Found
    NotFound(String),

    /// 409 Conflict
    Conflict(String),

    /// 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Internal(msg) => {
                error!("Internal API error: {}", msg);
                ErrorResponse::new(500, "INTERNAL_ERROR", "An internal server error occurred")
                    .with_details(msg)
            }
            ApiError::NotFound(msg) => ErrorResponse::new(404, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => ErrorResponse::new(409, "CONFLICT", msg),
            ApiError::ServiceUnavailable(msg) => {
                ErrorResponse::new(503, "SERVICE_UNAVAILABLE", msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = self.to_error_response();
        let status_code = StatusCode::from_u16(error_response.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_with_details() {
        let error = ErrorResponse::new(500, "INTERNAL_ERROR", "Something went wrong")
            .with_details("list secrets failed");

        assert_eq!(error.status, 500);
        assert_eq!(error.details.as_deref(), Some("list secrets failed"));
    }

    #[test]
    fn test_details_omitted_when_absent() {
        let json = serde_json::to_value(ErrorResponse::new(404, "NOT_FOUND", "gone")).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["error"], "NOT_FOUND");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::ServiceUnavailable("no cluster".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
