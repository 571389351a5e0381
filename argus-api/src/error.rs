/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`. Every error becomes the uniform
/// envelope with `data: null` and the human readable text in
/// `custom_message`. Internal errors are logged; their raw text is only put
/// in `data` by [`attach_error_details`] when the server is configured to
/// expose it.
///
/// | Error | Status |
/// |-------|--------|
/// | `BadRequest` | 400 |
/// | `Unauthorized` | 401 |
/// | `Forbidden` | 403 |
/// | `NotFound` | 404 |
/// | `Internal` | 500 |

use argus_shared::{
    auth::{jwt::TokenError, password::PasswordError},
    db::error::RepoError,
    storage::StorageError,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::response::Envelope;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The string is internal detail, never shown unless exposure is enabled
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Envelope with internal detail in `data`, kept on the response for
/// [`attach_error_details`]
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub Envelope);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, detail) = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ("Internal server error".to_string(), Some(detail))
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Request failed");
                (msg, None)
            }
        };

        let body = Envelope::new(status, Value::Null, Some(message));
        let detailed = detail.map(|d| Envelope {
            data: Value::String(d),
            ..body.clone()
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(detailed) = detailed {
            response.extensions_mut().insert(ErrorDetail(detailed));
        }
        response
    }
}

/// Swaps in the detailed error envelope when exposure is enabled
///
/// Use with `axum::middleware::map_response_with_state`.
pub async fn attach_error_details(State(expose): State<bool>, mut response: Response) -> Response {
    let Some(ErrorDetail(detailed)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !expose {
        return response;
    }

    let status = response.status();
    let mut replaced = (status, Json(detailed)).into_response();
    for (name, value) in response.headers() {
        if name != axum::http::header::CONTENT_LENGTH {
            replaced.headers_mut().insert(name.clone(), value.clone());
        }
    }
    replaced
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            RepoError::NotFound(msg) => ApiError::NotFound(msg),
            RepoError::Conflict { .. } => {
                ApiError::BadRequest(format!("Resource already exists: {}", err))
            }
            RepoError::NoFieldsToUpdate => ApiError::BadRequest("No fields to update".to_string()),
            RepoError::Persistence { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(e) => ApiError::Internal(format!("Token signing failed: {}", e)),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
