/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Exchange credentials for tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
///
/// Both are public. The refresh token itself is never stored; the user row
/// keeps its SHA-256 digest so a leaked database cannot mint sessions.

use argus_shared::{
    auth::jwt::digest_token,
    db::{error::RepoError, value::{Filters, Patch}},
    models::user::{User, UserChanges},
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{present, ValidatedJson},
    response::ApiResponse,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH: &str = "Invalid or expired refresh token";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required)]
    pub email: Option<String>,

    #[validate(required)]
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,

    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: &'static str,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    pub user: User,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(required)]
    pub refresh_token: Option<String>,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,

    pub token_type: &'static str,

    pub expires_in: i64,
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "email": "hr@example.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let email = present(req.email, "email")?;
    let password = present(req.password, "password")?;

    let users = state.repo::<User>();
    let user = match users.get(&Filters::new().eq("email", email.as_str())).await {
        Ok(user) => user,
        Err(RepoError::NotFound(_)) => {
            tracing::warn!(email = %email, "login for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    if !state.passwords.verify(&password, &user.hashed_password)? {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let access_token = state.tokens.issue_access(user.id, user.role.as_str())?;
    let refresh_token = state.tokens.issue_refresh(user.id)?;

    let user = users
        .update(
            user.id,
            UserChanges {
                hashed_refresh_token: Patch::Value(digest_token(&refresh_token)),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(user_id = user.id, role = %user.role, "user logged in");
    Ok(ApiResponse::ok(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.config.auth.access_ttl_seconds(),
        user,
    }))
}

/// Token refresh endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// Content-Type: application/json
///
/// { "refresh_token": "eyJ..." }
/// ```
///
/// The token must decode, carry `type = "refresh"` and match the digest
/// stored at the user's last login.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid, expired, wrong type or superseded token
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<RefreshResponse>> {
    let token = present(req.refresh_token, "refresh_token")?;
    let identity = state.tokens.decode(&token)?;

    if identity.token_type() != Some("refresh") {
        return Err(ApiError::Unauthorized(INVALID_REFRESH.to_string()));
    }
    let user_id = identity
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized(INVALID_REFRESH.to_string()))?;

    let user = match state.repo::<User>().find_by_id(user_id).await {
        Ok(user) => user,
        Err(RepoError::NotFound(_)) => {
            return Err(ApiError::Unauthorized(INVALID_REFRESH.to_string()))
        }
        Err(err) => return Err(err.into()),
    };

    if user.hashed_refresh_token.as_deref() != Some(digest_token(&token).as_str()) {
        tracing::warn!(user_id, "refresh token does not match the stored digest");
        return Err(ApiError::Unauthorized(INVALID_REFRESH.to_string()));
    }

    let access_token = state.tokens.issue_access(user.id, user.role.as_str())?;
    Ok(ApiResponse::ok(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.auth.access_ttl_seconds(),
    }))
}
