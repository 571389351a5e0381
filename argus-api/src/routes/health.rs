/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// Answers 200 even when the database is down; `status` then reads
/// `degraded`.
///
/// ```json
/// {
///   "status": "OK",
///   "description": "Request successful",
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// }
/// ```

use argus_shared::db::pool;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::ApiResult, response::ApiResponse};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,

    pub version: String,

    pub database: String,
}

impl HealthResponse {
    fn from_database(connected: bool) -> Self {
        let (status, database) = if connected {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<ApiResponse<HealthResponse>> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            false
        }
    };
    Ok(ApiResponse::ok(HealthResponse::from_database(connected)))
}
