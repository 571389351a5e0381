/// Task model
///
/// A task is created by an admin and optionally assigned to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

text_enum! {
    TaskStatus("status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    TaskPriority("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    pub assigned_to: Option<i64>,

    pub admin_id: i64,

    pub title: String,

    pub description: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub admin_id: i64,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskChanges {
    pub assigned_to: Patch<i64>,
    pub admin_id: Option<i64>,
    pub title: Option<String>,
    pub description: Patch<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Patch<DateTime<Utc>>,
}

impl IntoColumns for NewTask {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("admin_id", self.admin_id)
            .set("assigned_to", self.assigned_to)
            .set("title", self.title)
            .set("description", self.description)
            .set("status", self.status)
            .set("priority", self.priority)
            .set("due_date", self.due_date)
    }
}

impl IntoColumns for TaskChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_patch("assigned_to", self.assigned_to)
            .set_some("admin_id", self.admin_id)
            .set_some("title", self.title)
            .set_patch("description", self.description)
            .set_some("status", self.status)
            .set_some("priority", self.priority)
            .set_patch("due_date", self.due_date)
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const LABEL: &'static str = "Task";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "assigned_to",
        "admin_id",
        "title",
        "description",
        "status",
        "priority",
        "due_date",
        "created_at",
        "updated_at",
    ];
    const FILTERABLE: &'static [&'static str] =
        &["id", "assigned_to", "admin_id", "status", "priority"];
    const SEARCHABLE: &'static [&'static str] = &["title", "description", "status", "priority"];

    type New = NewTask;
    type Changes = TaskChanges;

    fn id(&self) -> i64 {
        self.id
    }
}
