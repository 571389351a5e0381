/// Typed column values, equality filters and partial-update fields
///
/// Repositories never interpolate caller data into SQL. Everything that
/// reaches a statement is a [`SqlValue`], bound as a parameter with a
/// concrete Postgres type, including NULLs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use sqlx::{Postgres, QueryBuilder};

/// A bindable value; every variant carries its own NULL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    BigInt(Option<i64>),
    Double(Option<f64>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::BigInt(v) => v.is_none(),
            SqlValue::Double(v) => v.is_none(),
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Date(v) => v.is_none(),
            SqlValue::Timestamp(v) => v.is_none(),
        }
    }

    pub(crate) fn push_bind(self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            SqlValue::BigInt(v) => qb.push_bind(v),
            SqlValue::Double(v) => qb.push_bind(v),
            SqlValue::Text(v) => qb.push_bind(v),
            SqlValue::Date(v) => qb.push_bind(v),
            SqlValue::Timestamp(v) => qb.push_bind(v),
        };
    }
}

/// Conversion into a [`SqlValue`] with a matching typed NULL
pub trait IntoSqlValue {
    fn into_sql(self) -> SqlValue;
    fn sql_null() -> SqlValue;
}

macro_rules! impl_into_sql_value {
    ($ty:ty, $variant:ident) => {
        impl IntoSqlValue for $ty {
            fn into_sql(self) -> SqlValue {
                SqlValue::$variant(Some(self.into()))
            }

            fn sql_null() -> SqlValue {
                SqlValue::$variant(None)
            }
        }
    };
}

impl_into_sql_value!(i64, BigInt);
impl_into_sql_value!(f64, Double);
impl_into_sql_value!(String, Text);
impl_into_sql_value!(&str, Text);
impl_into_sql_value!(NaiveDate, Date);
impl_into_sql_value!(DateTime<Utc>, Timestamp);

impl<T: IntoSqlValue> IntoSqlValue for Option<T> {
    fn into_sql(self) -> SqlValue {
        match self {
            Some(v) => v.into_sql(),
            None => T::sql_null(),
        }
    }

    fn sql_null() -> SqlValue {
        T::sql_null()
    }
}

/// Three-state field of an update request
///
/// `Missing` leaves the column alone, `Null` clears it, `Value` sets it.
/// Use with `#[serde(default)]` so an absent key deserializes to `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Ordered list of column assignments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues(Vec<(&'static str, SqlValue)>);

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl IntoSqlValue) -> Self {
        self.0.push((column, value.into_sql()));
        self
    }

    /// Skips `None`; for columns that cannot be cleared
    pub fn set_some<T: IntoSqlValue>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn set_patch<T: IntoSqlValue>(mut self, column: &'static str, patch: Patch<T>) -> Self {
        match patch {
            Patch::Missing => {}
            Patch::Null => self.0.push((column, T::sql_null())),
            Patch::Value(v) => self.0.push((column, v.into_sql())),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when at least one assignment carries a non-null value.
    /// Clearing columns alone does not count as an update.
    pub fn has_values(&self) -> bool {
        self.0.iter().any(|(_, v)| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(c, _)| *c)
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn into_inner(self) -> Vec<(&'static str, SqlValue)> {
        self.0
    }
}

/// Something a repository can turn into column assignments
pub trait IntoColumns {
    fn into_columns(self) -> ColumnValues;
}

/// Exact-match `column = value` constraints, ANDed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<(&'static str, SqlValue)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &'static str, value: impl IntoSqlValue) -> Self {
        self.0.push((column, value.into_sql()));
        self
    }

    /// Adds the constraint only when a value is given
    pub fn eq_some<T: IntoSqlValue>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, SqlValue)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Req {
        #[serde(default)]
        bio: Patch<String>,
        #[serde(default)]
        due: Patch<i64>,
    }

    #[test]
    fn test_patch_three_states() {
        let req: Req = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(req.bio, Patch::Null);
        assert_eq!(req.due, Patch::Missing);

        let req: Req = serde_json::from_str(r#"{"bio": "hi", "due": 3}"#).unwrap();
        assert_eq!(req.bio, Patch::Value("hi".to_string()));
        assert_eq!(req.due.as_value(), Some(&3));
    }

    #[test]
    fn test_column_values_respect_patch() {
        let cols = ColumnValues::new()
            .set_patch("bio", Patch::<String>::Missing)
            .set_patch("photo_url", Patch::<String>::Null)
            .set_some("first_name", None::<String>)
            .set_some("last_name", Some("Doe".to_string()))
            .set("role", "admin");

        assert_eq!(cols.columns().collect::<Vec<_>>(), vec!["photo_url", "last_name", "role"]);
        assert_eq!(cols.get("photo_url"), Some(&SqlValue::Text(None)));
        assert!(cols.get("photo_url").unwrap().is_null());
        assert!(cols.has_values());
    }

    #[test]
    fn test_nulls_alone_carry_no_values() {
        let cols = ColumnValues::new()
            .set_patch("description", Patch::<String>::Null)
            .set_patch("due_date", Patch::<i64>::Null);
        assert!(!cols.is_empty());
        assert!(!cols.has_values());

        let cols = cols.set_patch("title", Patch::Value("Report".to_string()));
        assert!(cols.has_values());
    }

    #[test]
    fn test_typed_nulls() {
        assert_eq!(None::<i64>.into_sql(), SqlValue::BigInt(None));
        assert_eq!(None::<NaiveDate>.into_sql(), SqlValue::Date(None));
        assert_eq!(Some(2.5f64).into_sql(), SqlValue::Double(Some(2.5)));
    }

    #[test]
    fn test_filters() {
        let f = Filters::new().eq("status", "late").eq_some("user_id", None::<i64>);
        assert_eq!(f.iter().count(), 1);
        assert!(Filters::new().is_empty());
        assert_eq!(
            Filters::by_id(4).iter().next(),
            Some(&("id", SqlValue::BigInt(Some(4))))
        );
    }
}
