/// Task endpoints
///
/// Admins manage tasks; users may read them and update their progress.

use argus_shared::{
    auth::authorization::ResourceGrants,
    db::value::{Filters, Patch},
    models::task::{NewTask, Task, TaskChanges, TaskPriority, TaskStatus},
};
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{enum_filter, id_filter, present, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
};

pub const RESOURCE: &str = "/v1/tasks/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[
        ("super_admin", ALL_METHODS),
        ("admin", ALL_METHODS),
        ("user", &["GET", "PUT"]),
    ],
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(required, range(min = 1))]
    pub admin_id: Option<i64>,

    pub assigned_to: Option<i64>,

    #[validate(required, length(min = 1, max = 255))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(required)]
    pub status: Option<TaskStatus>,

    #[validate(required)]
    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateTaskRequest {
    pub assigned_to: Patch<i64>,

    #[validate(range(min = 1))]
    pub admin_id: Option<i64>,

    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub description: Patch<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Patch<DateTime<Utc>>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskChanges {
            assigned_to: req.assigned_to,
            admin_id: req.admin_id,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub assigned_to: Option<String>,
    pub admin_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TaskListQuery {
    fn filters(&self) -> ApiResult<Filters> {
        Ok(Filters::new()
            .eq_some("assigned_to", id_filter("assigned_to", self.assigned_to.as_deref())?)
            .eq_some("admin_id", id_filter("admin_id", self.admin_id.as_deref())?)
            .eq_some("status", enum_filter::<TaskStatus>("status", self.status.as_deref())?)
            .eq_some(
                "priority",
                enum_filter::<TaskPriority>("priority", self.priority.as_deref())?,
            ))
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    let new_task = NewTask {
        admin_id: present(req.admin_id, "admin_id")?,
        assigned_to: req.assigned_to,
        title: present(req.title, "title")?,
        description: req.description,
        status: present(req.status, "status")?,
        priority: present(req.priority, "priority")?,
        due_date: req.due_date,
    };

    let task = state.repo::<Task>().create(new_task).await?;
    tracing::info!(task_id = task.id, admin_id = task.admin_id, "task created");
    Ok(ApiResponse::created(task))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<ApiResponse<Page<Task>>> {
    let filters = query.filters()?;
    super::crud::list_page::<Task>(&state, &query.page, filters).await
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    super::crud::update_by_id::<Task>(&state, &raw_id, req.into()).await
}
