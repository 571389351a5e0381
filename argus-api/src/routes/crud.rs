/// Handlers shared by every entity router
///
/// `get_one` and `delete_one` are mounted directly, e.g.
/// `get(crud::get_one::<Task>)`. Create, list and update need per-entity
/// payloads and filters, so those handlers call [`list_page`] and
/// [`update_by_id`] after parsing their input.

use argus_shared::db::{repository::Entity, value::Filters};
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{parse_id, PageParams},
    response::{ApiResponse, Page},
};

/// `GET /v1/{entities}/{id}`
pub async fn get_one<E>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<ApiResponse<E>>
where
    E: Entity + Serialize,
{
    let id = parse_id::<E>(&raw_id)?;
    let entity = state.repo::<E>().find_by_id(id).await?;
    Ok(ApiResponse::ok(entity))
}

/// `DELETE /v1/{entities}/{id}`
pub async fn delete_one<E: Entity>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let id = parse_id::<E>(&raw_id)?;
    state.repo::<E>().delete(id).await?;
    Ok(deleted::<E>())
}

pub(crate) fn deleted<E: Entity>() -> ApiResponse<Value> {
    ApiResponse::ok(Value::Null).with_message(format!("{} deleted successfully", E::LABEL))
}

/// Runs a filtered, searched and paginated list
pub(crate) async fn list_page<E>(
    state: &AppState,
    params: &PageParams,
    filters: Filters,
) -> ApiResult<ApiResponse<Page<E>>>
where
    E: Entity + Serialize,
{
    let pagination = params.pagination();
    let result = state
        .repo::<E>()
        .list(pagination.limit, pagination.offset(), &filters, params.search())
        .await?;

    Ok(ApiResponse::ok(Page {
        items: result.items,
        total: result.total,
        page: pagination.page,
        limit: pagination.limit,
    }))
}

/// Applies a changeset to the row named by the path id
pub(crate) async fn update_by_id<E>(
    state: &AppState,
    raw_id: &str,
    changes: E::Changes,
) -> ApiResult<ApiResponse<E>>
where
    E: Entity + Serialize,
{
    let id = parse_id::<E>(raw_id)?;
    let entity = state.repo::<E>().update(id, changes).await?;
    Ok(ApiResponse::ok(entity))
}
