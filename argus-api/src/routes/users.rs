/// User endpoints
///
/// - `POST   /v1/users`      create (password hashed with Argon2id)
/// - `GET    /v1/users`      list, filter `role`
/// - `GET    /v1/users/:id`  fetch
/// - `PUT    /v1/users/:id`  partial update, `password` re-hashed
/// - `DELETE /v1/users/:id`  delete
///
/// Email and phone are unique; a duplicate answers 400.

use argus_shared::{
    auth::authorization::ResourceGrants,
    db::{error::RepoError, value::{Filters, Patch}},
    models::user::{NewUser, User, UserChanges, UserRole},
};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{enum_filter, parse_id, present, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
    validation::{validate_email, validate_phone},
};

pub const RESOURCE: &str = "/v1/users/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[("super_admin", ALL_METHODS), ("admin", ALL_METHODS)],
};

const DUPLICATE: &str = "User with this email or phone already exists";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(required, length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(required, length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(required)]
    pub role: Option<UserRole>,

    #[validate(required)]
    pub email: Option<String>,

    #[validate(required)]
    pub phone: Option<String>,

    #[validate(required, length(min = 6, max = 128, message = "Password must be 6 to 128 characters"))]
    pub password: Option<String>,

    pub photo_url: Option<String>,

    pub bio: Option<String>,
}

/// Absent keys are left alone; `null` clears `photo_url` and `bio`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    pub role: Option<UserRole>,

    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(length(min = 6, max = 128, message = "Password must be 6 to 128 characters"))]
    pub password: Option<String>,

    pub photo_url: Patch<String>,

    pub bio: Patch<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub role: Option<String>,
}

fn check_contact(email: Option<&str>, phone: Option<&str>) -> Result<(), ApiError> {
    if let Some(email) = email {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).map_err(ApiError::BadRequest)?;
    }
    Ok(())
}

fn duplicate_as_bad_request(err: RepoError) -> ApiError {
    match err {
        RepoError::Conflict { .. } => ApiError::BadRequest(DUPLICATE.to_string()),
        other => other.into(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    check_contact(req.email.as_deref(), req.phone.as_deref())?;

    let password = present(req.password, "password")?;
    let new_user = NewUser {
        first_name: present(req.first_name, "first_name")?,
        last_name: present(req.last_name, "last_name")?,
        role: present(req.role, "role")?,
        email: present(req.email, "email")?,
        phone: present(req.phone, "phone")?,
        photo_url: req.photo_url,
        bio: req.bio,
        hashed_password: state.passwords.hash(&password)?,
    };

    let user = state
        .repo::<User>()
        .create(new_user)
        .await
        .map_err(duplicate_as_bad_request)?;

    tracing::info!(user_id = user.id, role = %user.role, "user created");
    Ok(ApiResponse::created(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<ApiResponse<Page<User>>> {
    let filters =
        Filters::new().eq_some("role", enum_filter::<UserRole>("role", query.role.as_deref())?);
    super::crud::list_page::<User>(&state, &query.page, filters).await
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    let id = parse_id::<User>(&raw_id)?;
    check_contact(req.email.as_deref(), req.phone.as_deref())?;

    let hashed_password = match req.password {
        Some(password) => Some(state.passwords.hash(&password)?),
        None => None,
    };

    let changes = UserChanges {
        first_name: req.first_name,
        last_name: req.last_name,
        role: req.role,
        email: req.email,
        phone: req.phone,
        photo_url: req.photo_url,
        bio: req.bio,
        hashed_password,
        hashed_refresh_token: Patch::Missing,
    };

    let user = state
        .repo::<User>()
        .update(id, changes)
        .await
        .map_err(duplicate_as_bad_request)?;
    Ok(ApiResponse::ok(user))
}
