/// Salary model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Currency;
use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

text_enum! {
    SalaryStatus("status") {
        Paid => "paid",
        Pending => "pending",
        Overdue => "overdue",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Salary {
    pub id: i64,

    pub amount: f64,

    pub user_id: i64,

    pub admin_id: i64,

    /// Last admin to change the record
    pub updater_admin_id: Option<i64>,

    pub pay_date: NaiveDate,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    #[sqlx(try_from = "String")]
    pub status: SalaryStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSalary {
    pub amount: f64,
    pub user_id: i64,
    pub admin_id: i64,
    pub pay_date: NaiveDate,
    pub currency: Currency,
    pub status: SalaryStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SalaryChanges {
    pub amount: Option<f64>,
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub updater_admin_id: Patch<i64>,
    pub pay_date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub status: Option<SalaryStatus>,
}

impl IntoColumns for NewSalary {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("amount", self.amount)
            .set("user_id", self.user_id)
            .set("admin_id", self.admin_id)
            .set("pay_date", self.pay_date)
            .set("currency", self.currency)
            .set("status", self.status)
    }
}

impl IntoColumns for SalaryChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_some("amount", self.amount)
            .set_some("user_id", self.user_id)
            .set_some("admin_id", self.admin_id)
            .set_patch("updater_admin_id", self.updater_admin_id)
            .set_some("pay_date", self.pay_date)
            .set_some("currency", self.currency)
            .set_some("status", self.status)
    }
}

impl Entity for Salary {
    const TABLE: &'static str = "salaries";
    const LABEL: &'static str = "Salary";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "amount",
        "user_id",
        "admin_id",
        "updater_admin_id",
        "pay_date",
        "currency",
        "status",
        "created_at",
        "updated_at",
    ];
    const FILTERABLE: &'static [&'static str] = &["id", "user_id", "admin_id", "status", "pay_date"];
    const SEARCHABLE: &'static [&'static str] = &["currency", "status"];

    type New = NewSalary;
    type Changes = SalaryChanges;

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::value::SqlValue;

    #[test]
    fn test_changes_from_json() {
        let changes: SalaryChanges =
            serde_json::from_str(r#"{"amount": 1500.5, "currency": "EUR", "updater_admin_id": 4}"#)
                .unwrap();
        let cols = changes.into_columns();

        assert_eq!(cols.get("amount"), Some(&SqlValue::Double(Some(1500.5))));
        assert_eq!(cols.get("currency"), Some(&SqlValue::Text(Some("EUR".to_string()))));
        assert_eq!(cols.get("updater_admin_id"), Some(&SqlValue::BigInt(Some(4))));
        assert_eq!(cols.len(), 3);
    }

    #[test]
    fn test_lowercase_currency_rejected() {
        assert!(serde_json::from_str::<SalaryChanges>(r#"{"currency": "usd"}"#).is_err());
    }
}
