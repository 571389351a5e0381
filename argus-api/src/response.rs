/// Uniform response envelope
///
/// Every endpoint answers with
///
/// ```json
/// {
///   "status": "OK",
///   "description": "Request successful",
///   "data": { ... },
///   "custom_message": "optional"
/// }
/// ```
///
/// `status` is the canonical reason phrase of the HTTP status and
/// `description` a fixed phrase per status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub status: String,
    pub description: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, data: T, custom_message: Option<String>) -> Self {
        Self {
            status: status.canonical_reason().unwrap_or("Unknown").to_string(),
            description: describe(status).to_string(),
            data,
            custom_message,
        }
    }
}

/// Fixed description for a status code
pub fn describe(status: StatusCode) -> &'static str {
    match status {
        StatusCode::OK => "Request successful",
        StatusCode::CREATED => "Resource created successfully",
        StatusCode::BAD_REQUEST => "Invalid request data",
        StatusCode::UNAUTHORIZED => "Authentication required",
        StatusCode::FORBIDDEN => "Access denied",
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
        _ => "An unexpected error occurred",
    }
}

/// A successful response carrying `data`
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
    message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
            message: None,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope::new(self.status, self.data, self.message);
        (self.status, Json(body)).into_response()
    }
}

/// `data` of list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
