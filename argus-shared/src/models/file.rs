/// File metadata model
///
/// `name` is the object key in the blob store; the bytes themselves never
/// touch the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct File {
    pub id: i64,

    pub name: String,

    pub task_id: Option<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub task_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileChanges {
    pub name: Option<String>,
    pub task_id: Patch<i64>,
}

impl IntoColumns for NewFile {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("name", self.name)
            .set("task_id", self.task_id)
    }
}

impl IntoColumns for FileChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_some("name", self.name)
            .set_patch("task_id", self.task_id)
    }
}

impl Entity for File {
    const TABLE: &'static str = "files";
    const LABEL: &'static str = "File";
    const COLUMNS: &'static [&'static str] = &["id", "name", "task_id", "created_at", "updated_at"];
    const FILTERABLE: &'static [&'static str] = &["id", "name", "task_id"];
    const SEARCHABLE: &'static [&'static str] = &["name"];

    type New = NewFile;
    type Changes = FileChanges;

    fn id(&self) -> i64 {
        self.id
    }
}
