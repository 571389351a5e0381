/// Attendance endpoints

use argus_shared::{
    auth::authorization::ResourceGrants,
    db::value::Filters,
    models::attendance::{Attendance, AttendanceChanges, AttendanceStatus, NewAttendance},
};
use axum::extract::{Path, Query, State};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{date_filter, enum_filter, id_filter, present, JsonBody, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
};

pub const RESOURCE: &str = "/v1/attendance/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[
        ("super_admin", ALL_METHODS),
        ("admin", ALL_METHODS),
        ("user", &["GET"]),
    ],
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttendanceRequest {
    #[validate(required, range(min = 1))]
    pub user_id: Option<i64>,

    #[validate(required)]
    pub date: Option<NaiveDate>,

    #[validate(required)]
    pub in_time: Option<DateTime<Utc>>,

    pub out_time: Option<DateTime<Utc>>,

    #[validate(required)]
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl AttendanceListQuery {
    fn filters(&self) -> ApiResult<Filters> {
        Ok(Filters::new()
            .eq_some("user_id", id_filter("user_id", self.user_id.as_deref())?)
            .eq_some("date", date_filter(self.date.as_deref())?)
            .eq_some(
                "status",
                enum_filter::<AttendanceStatus>("status", self.status.as_deref())?,
            ))
    }
}

pub async fn create_attendance(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateAttendanceRequest>,
) -> ApiResult<ApiResponse<Attendance>> {
    let record = NewAttendance {
        user_id: present(req.user_id, "user_id")?,
        date: present(req.date, "date")?,
        in_time: present(req.in_time, "in_time")?,
        out_time: req.out_time,
        status: present(req.status, "status")?,
    };

    let attendance = state.repo::<Attendance>().create(record).await?;
    tracing::info!(
        attendance_id = attendance.id,
        user_id = attendance.user_id,
        date = %attendance.date,
        "attendance recorded"
    );
    Ok(ApiResponse::created(attendance))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceListQuery>,
) -> ApiResult<ApiResponse<Page<Attendance>>> {
    let filters = query.filters()?;
    super::crud::list_page::<Attendance>(&state, &query.page, filters).await
}

pub async fn update_attendance(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(changes): JsonBody<AttendanceChanges>,
) -> ApiResult<ApiResponse<Attendance>> {
    super::crud::update_by_id::<Attendance>(&state, &raw_id, changes).await
}
