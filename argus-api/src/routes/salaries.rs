/// Salary endpoints (admin only)

use argus_shared::{
    auth::{authorization::ResourceGrants, jwt::Identity},
    db::value::{Filters, Patch},
    models::{
        salary::{NewSalary, Salary, SalaryChanges, SalaryStatus},
        Currency,
    },
};
use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{date_filter, enum_filter, id_filter, present, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
};

pub const RESOURCE: &str = "/v1/salaries/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[("super_admin", ALL_METHODS), ("admin", ALL_METHODS)],
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalaryRequest {
    #[validate(required, range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,

    #[validate(required, range(min = 1))]
    pub user_id: Option<i64>,

    #[validate(required, range(min = 1))]
    pub admin_id: Option<i64>,

    #[validate(required)]
    pub pay_date: Option<NaiveDate>,

    #[validate(required)]
    pub currency: Option<Currency>,

    #[validate(required)]
    pub status: Option<SalaryStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateSalaryRequest {
    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,

    pub user_id: Option<i64>,

    pub admin_id: Option<i64>,

    pub updater_admin_id: Patch<i64>,

    pub pay_date: Option<NaiveDate>,

    pub currency: Option<Currency>,

    pub status: Option<SalaryStatus>,
}

impl UpdateSalaryRequest {
    /// True when the body sets at least one column to a non-null value
    fn has_values(&self) -> bool {
        self.amount.is_some()
            || self.user_id.is_some()
            || self.admin_id.is_some()
            || self.updater_admin_id.as_value().is_some()
            || self.pay_date.is_some()
            || self.currency.is_some()
            || self.status.is_some()
    }

    /// Records the caller as the updater unless the body names one.
    /// A body without values stays empty so the update is rejected.
    fn into_changes(self, caller: Option<i64>) -> SalaryChanges {
        let has_values = self.has_values();
        let updater_admin_id = match (self.updater_admin_id, caller) {
            (Patch::Missing, Some(id)) if has_values => Patch::Value(id),
            (patch, _) => patch,
        };
        SalaryChanges {
            amount: self.amount,
            user_id: self.user_id,
            admin_id: self.admin_id,
            updater_admin_id,
            pay_date: self.pay_date,
            currency: self.currency,
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SalaryListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub user_id: Option<String>,
    pub admin_id: Option<String>,
    pub status: Option<String>,
    pub pay_date: Option<String>,
}

impl SalaryListQuery {
    fn filters(&self) -> ApiResult<Filters> {
        Ok(Filters::new()
            .eq_some("user_id", id_filter("user_id", self.user_id.as_deref())?)
            .eq_some("admin_id", id_filter("admin_id", self.admin_id.as_deref())?)
            .eq_some("status", enum_filter::<SalaryStatus>("status", self.status.as_deref())?)
            .eq_some("pay_date", date_filter(self.pay_date.as_deref())?))
    }
}

pub async fn create_salary(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateSalaryRequest>,
) -> ApiResult<ApiResponse<Salary>> {
    let new_salary = NewSalary {
        amount: present(req.amount, "amount")?,
        user_id: present(req.user_id, "user_id")?,
        admin_id: present(req.admin_id, "admin_id")?,
        pay_date: present(req.pay_date, "pay_date")?,
        currency: present(req.currency, "currency")?,
        status: present(req.status, "status")?,
    };

    let salary = state.repo::<Salary>().create(new_salary).await?;
    tracing::info!(salary_id = salary.id, user_id = salary.user_id, "salary created");
    Ok(ApiResponse::created(salary))
}

pub async fn list_salaries(
    State(state): State<AppState>,
    Query(query): Query<SalaryListQuery>,
) -> ApiResult<ApiResponse<Page<Salary>>> {
    let filters = query.filters()?;
    super::crud::list_page::<Salary>(&state, &query.page, filters).await
}

pub async fn update_salary(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSalaryRequest>,
) -> ApiResult<ApiResponse<Salary>> {
    let caller = identity.and_then(|Extension(identity)| identity.user_id());
    super::crud::update_by_id::<Salary>(&state, &raw_id, req.into_changes(caller)).await
}
