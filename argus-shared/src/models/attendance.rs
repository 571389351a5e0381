/// Attendance model
///
/// One row per user per working day. `in_time`/`out_time` are full
/// timestamps; `date` is the calendar day the record belongs to.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

text_enum! {
    AttendanceStatus("status") {
        Present => "present",
        Absent => "absent",
        Late => "late",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,

    pub user_id: i64,

    pub date: NaiveDate,

    pub in_time: DateTime<Utc>,

    pub out_time: Option<DateTime<Utc>>,

    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: i64,
    pub date: NaiveDate,
    pub in_time: DateTime<Utc>,
    pub out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AttendanceChanges {
    pub user_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub in_time: Option<DateTime<Utc>>,
    pub out_time: Patch<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
}

impl IntoColumns for NewAttendance {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("user_id", self.user_id)
            .set("date", self.date)
            .set("in_time", self.in_time)
            .set("out_time", self.out_time)
            .set("status", self.status)
    }
}

impl IntoColumns for AttendanceChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_some("user_id", self.user_id)
            .set_some("date", self.date)
            .set_some("in_time", self.in_time)
            .set_patch("out_time", self.out_time)
            .set_some("status", self.status)
    }
}

impl Entity for Attendance {
    const TABLE: &'static str = "attendance";
    const LABEL: &'static str = "Attendance";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "date",
        "in_time",
        "out_time",
        "status",
        "created_at",
        "updated_at",
    ];
    const FILTERABLE: &'static [&'static str] = &["id", "user_id", "date", "status"];
    const SEARCHABLE: &'static [&'static str] = &["status"];
    const ORDER_BY: &'static str = "created_at DESC, in_time DESC, id DESC";

    type New = NewAttendance;
    type Changes = AttendanceChanges;

    fn id(&self) -> i64 {
        self.id
    }
}
