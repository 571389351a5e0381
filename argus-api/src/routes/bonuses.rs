/// Bonus endpoints (admin only)

use argus_shared::{
    auth::authorization::ResourceGrants,
    db::value::{Filters, Patch},
    models::{
        bonus::{Bonus, BonusChanges, NewBonus},
        Currency,
    },
};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use validator::Validate;

use super::ALL_METHODS;
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{id_filter, present, PageParams, ValidatedJson},
    response::{ApiResponse, Page},
};

pub const RESOURCE: &str = "/v1/bonuses/";

pub const GRANTS: ResourceGrants = ResourceGrants {
    resource: RESOURCE,
    grants: &[("super_admin", ALL_METHODS), ("admin", ALL_METHODS)],
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBonusRequest {
    pub super_admin_id: Option<i64>,

    #[validate(required, range(min = 1))]
    pub user_id: Option<i64>,

    #[validate(required, range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,

    #[validate(required)]
    pub currency: Option<Currency>,

    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateBonusRequest {
    pub super_admin_id: Patch<i64>,

    pub user_id: Option<i64>,

    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,

    pub currency: Option<Currency>,

    pub reason: Patch<String>,
}

impl From<UpdateBonusRequest> for BonusChanges {
    fn from(req: UpdateBonusRequest) -> Self {
        BonusChanges {
            super_admin_id: req.super_admin_id,
            user_id: req.user_id,
            amount: req.amount,
            currency: req.currency,
            reason: req.reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BonusListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub user_id: Option<String>,
    pub super_admin_id: Option<String>,
}

pub async fn create_bonus(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateBonusRequest>,
) -> ApiResult<ApiResponse<Bonus>> {
    let new_bonus = NewBonus {
        super_admin_id: req.super_admin_id,
        user_id: present(req.user_id, "user_id")?,
        amount: present(req.amount, "amount")?,
        currency: present(req.currency, "currency")?,
        reason: req.reason,
    };

    let bonus = state.repo::<Bonus>().create(new_bonus).await?;
    tracing::info!(bonus_id = bonus.id, user_id = bonus.user_id, "bonus created");
    Ok(ApiResponse::created(bonus))
}

pub async fn list_bonuses(
    State(state): State<AppState>,
    Query(query): Query<BonusListQuery>,
) -> ApiResult<ApiResponse<Page<Bonus>>> {
    let filters = Filters::new()
        .eq_some("user_id", id_filter("user_id", query.user_id.as_deref())?)
        .eq_some(
            "super_admin_id",
            id_filter("super_admin_id", query.super_admin_id.as_deref())?,
        );
    super::crud::list_page::<Bonus>(&state, &query.page, filters).await
}

pub async fn update_bonus(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBonusRequest>,
) -> ApiResult<ApiResponse<Bonus>> {
    super::crud::update_by_id::<Bonus>(&state, &raw_id, req.into()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_user_amount_currency() {
        let req: CreateBonusRequest = serde_json::from_str(r#"{"reason": "Q1"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let mut fields: Vec<String> =
            errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        assert_eq!(fields, vec!["amount", "currency", "user_id"]);
    }

    #[test]
    fn test_update_clears_reason() {
        let req: UpdateBonusRequest = serde_json::from_str(r#"{"reason": null}"#).unwrap();
        assert!(req.validate().is_ok());
        let changes: BonusChanges = req.into();
        assert_eq!(changes.reason, Patch::Null);
        assert_eq!(changes.super_admin_id, Patch::Missing);
    }
}
