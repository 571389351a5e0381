/// File endpoints
///
/// Metadata rows live in `files`; uploaded bytes go to the object store
/// under a generated key that becomes the row's `name`.
///
/// - `POST   /v1/files`         create a metadata row
/// - `POST   /v1/files/upload`  multipart upload (`file`, optional `task_id`)
/// - `GET    /v1/files`         list, filter `task_id`
/// - `GET    /v1/files/:id`     fetch
/// - `PUT    /v1/files/:id`     rename or re-attach
/// - `DELETE /v1/files/:id`     delete row and blob

use argus_shared::{
    auth::authorization::ResourceGrants,
    db::value::Filters,
    models::file::{File, FileChanges, NewFile},
};
use axum::extract::{Multipart, Path, Query, State};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{id_filter, parse_id, present, JsonBody, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
};

pub const RESOURCE: &str = "/v1/files/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[("super_admin", ALL_METHODS), ("admin", ALL_METHODS)],
};

/// Headroom over the file size limit for multipart framing and other fields
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFileRequest {
    #[validate(required, length(min = 1, max = 255))]
    pub name: Option<String>,

    pub task_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FileListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub file: File,
    pub url: String,
}

/// Parsed multipart form
#[derive(Debug, Default)]
struct UploadForm {
    body: Option<Bytes>,
    file_name: Option<String>,
    content_type: Option<String>,
    task_id: Option<i64>,
}

/// Object key: a fresh UUID, keeping the original extension
fn object_key(file_name: Option<&str>) -> String {
    let id = uuid::Uuid::new_v4();
    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", id, ext.to_lowercase()),
        None => id.to_string(),
    }
}

async fn read_form(mut multipart: Multipart, max_size: usize) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                if body.len() > max_size {
                    return Err(ApiError::BadRequest(format!(
                        "File too large: {} bytes (max {})",
                        body.len(),
                        max_size
                    )));
                }
                form.body = Some(body);
            }
            Some("task_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?;
                form.task_id = id_filter("task_id", Some(&raw))?;
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn create_file(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> ApiResult<ApiResponse<File>> {
    let new_file = NewFile {
        name: present(req.name, "name")?,
        task_id: req.task_id,
    };
    let file = state.repo::<File>().create(new_file).await?;
    Ok(ApiResponse::created(file))
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<UploadedFile>> {
    let max_size = state.config.storage.max_file_size;
    let form = read_form(multipart, max_size).await?;

    let body = form
        .body
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let key = object_key(form.file_name.as_deref());
    state
        .storage
        .put(&key, body, form.content_type.as_deref())
        .await?;

    let created = state
        .repo::<File>()
        .create(NewFile {
            name: key.clone(),
            task_id: form.task_id,
        })
        .await;

    let file = match created {
        Ok(file) => file,
        Err(err) => {
            if let Err(cleanup) = state.storage.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "failed to remove orphaned upload");
            }
            return Err(err.into());
        }
    };

    tracing::info!(file_id = file.id, key = %key, task_id = ?file.task_id, "file uploaded");
    let url = state.storage.url(&key);
    Ok(ApiResponse::created(UploadedFile { file, url }))
}

pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> ApiResult<ApiResponse<Page<File>>> {
    let filters = Filters::new().eq_some("task_id", id_filter("task_id", query.task_id.as_deref())?);
    super::crud::list_page::<File>(&state, &query.page, filters).await
}

pub async fn update_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(changes): JsonBody<FileChanges>,
) -> ApiResult<ApiResponse<File>> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("Invalid fields: name".to_string()));
    }
    super::crud::update_by_id::<File>(&state, &raw_id, changes).await
}

/// Deletes the row, then the blob; a blob failure is only logged
pub async fn delete_file(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let id = parse_id::<File>(&raw_id)?;
    let repo = state.repo::<File>();
    let file = repo.find_by_id(id).await?;
    repo.delete(id).await?;

    if let Err(err) = state.storage.delete(&file.name).await {
        tracing::warn!(file_id = id, key = %file.name, error = %err, "blob delete failed");
    }

    Ok(super::crud::deleted::<File>())
}
