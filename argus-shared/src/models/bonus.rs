/// Bonus model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Currency;
use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bonus {
    pub id: i64,

    /// Granting super admin, if recorded
    pub super_admin_id: Option<i64>,

    pub user_id: i64,

    pub amount: f64,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    pub reason: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBonus {
    pub super_admin_id: Option<i64>,
    pub user_id: i64,
    pub amount: f64,
    pub currency: Currency,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BonusChanges {
    pub super_admin_id: Patch<i64>,
    pub user_id: Option<i64>,
    pub amount: Option<f64>,
    pub currency: Option<Currency>,
    pub reason: Patch<String>,
}

impl IntoColumns for NewBonus {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("super_admin_id", self.super_admin_id)
            .set("user_id", self.user_id)
            .set("amount", self.amount)
            .set("currency", self.currency)
            .set("reason", self.reason)
    }
}

impl IntoColumns for BonusChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_patch("super_admin_id", self.super_admin_id)
            .set_some("user_id", self.user_id)
            .set_some("amount", self.amount)
            .set_some("currency", self.currency)
            .set_patch("reason", self.reason)
    }
}

impl Entity for Bonus {
    const TABLE: &'static str = "bonuses";
    const LABEL: &'static str = "Bonus";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "super_admin_id",
        "user_id",
        "amount",
        "currency",
        "reason",
        "created_at",
        "updated_at",
    ];
    const FILTERABLE: &'static [&'static str] = &["id", "user_id", "super_admin_id"];
    const SEARCHABLE: &'static [&'static str] = &["reason"];

    type New = NewBonus;
    type Changes = BonusChanges;

    fn id(&self) -> i64 {
        self.id
    }
}
