/// Request extractors and parameter parsing
///
/// - [`JsonBody`]: JSON body whose rejections become 400 envelopes
/// - [`ValidatedJson`]: [`JsonBody`] plus `validator` checks
/// - [`PageParams`]: `page`/`limit`/`search` query parameters
/// - helpers that parse path ids and list filters into typed values

use argus_shared::db::repository::Entity;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// `Json<T>` with rejections mapped to [`ApiError::BadRequest`]
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// A JSON body that also passed its `#[validate]` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}

/// Names the failing fields, sorted
///
/// A missing required field yields "Missing or invalid required fields: a, b";
/// otherwise "Invalid fields: a (message), b".
pub fn validation_error(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<(String, Option<String>, bool)> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let required = errs.iter().any(|e| e.code == "required");
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()));
            (field.to_string(), message, required)
        })
        .collect();
    fields.sort();

    if fields.iter().any(|(_, _, required)| *required) {
        let names: Vec<&str> = fields.iter().map(|(f, _, _)| f.as_str()).collect();
        return ApiError::BadRequest(format!(
            "Missing or invalid required fields: {}",
            names.join(", ")
        ));
    }

    let described: Vec<String> = fields
        .into_iter()
        .map(|(field, message, _)| match message {
            Some(m) => format!("{} ({})", field, m),
            None => field,
        })
        .collect();
    ApiError::BadRequest(format!("Invalid fields: {}", described.join(", ")))
}

/// Unwraps a field that validation already marked as required
pub fn present<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing or invalid required fields: {}", field))
    })
}

/// `page`, `limit` and `search` from the query string
///
/// Values are kept as strings so a malformed number falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// Resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Rows to skip; saturates so a huge page yields an empty result
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: positive_or(self.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(self.limit.as_deref(), DEFAULT_LIMIT),
        }
    }

    /// Trimmed search text; `None` when blank
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Parses a path id, rejecting non-numeric and non-positive values
pub fn parse_id<E: Entity>(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid {} ID format", E::LABEL.to_lowercase()))
        })
}

/// Parses an optional id filter from the query string
pub fn id_filter(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} format", name))),
    }
}

/// Parses an optional enumerated filter (status, role, ...)
pub fn enum_filter<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {} value: {}", name, v))),
    }
}

/// Parses an optional `YYYY-MM-DD` filter
pub fn date_filter(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string())),
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}
