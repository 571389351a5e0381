/// Generic CRUD repository
///
/// One [`Repository`] serves every table. An [`Entity`] describes its table,
/// the columns to select, which columns may be filtered or searched and how a
/// list is ordered; the repository turns that into parameterized SQL.
///
/// # Semantics
///
/// - `create` inserts inside a transaction with fresh `created_at`/`updated_at`
///   and returns the stored row.
/// - `get` needs at least one filter. With several matches the lowest id wins.
/// - `list` applies the same filter and search predicate to the page query and
///   to the total count.
/// - `update` writes only the supplied columns plus `updated_at`, inside a
///   transaction, and returns the stored row.
/// - `delete` is a hard delete by primary key.
///
/// # Example
///
/// ```no_run
/// use argus_shared::db::{repository::Repository, value::Filters};
/// use argus_shared::models::bonus::Bonus;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let bonuses = Repository::<Bonus>::new(pool);
/// let page = bonuses
///     .list(10, 10, &Filters::new().eq("user_id", 3i64), Some("q3"))
///     .await?;
/// println!("{} of {}", page.items.len(), page.total);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;
use tracing::{debug, instrument};

use super::{
    error::RepoError,
    value::{Filters, IntoColumns},
};

/// A table-backed record
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    const TABLE: &'static str;

    /// Human readable name used in error messages
    const LABEL: &'static str;

    /// Columns selected and returned, `id` first
    const COLUMNS: &'static [&'static str];

    /// Columns allowed in [`Filters`]
    const FILTERABLE: &'static [&'static str];

    /// Columns matched with `ILIKE` by the list search
    const SEARCHABLE: &'static [&'static str];

    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    type New: IntoColumns + Send;
    type Changes: IntoColumns + Send;

    fn id(&self) -> i64;
}

/// One page of a list plus the total number of matching rows
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<E> {
    pub items: Vec<E>,
    pub total: i64,
}

pub struct Repository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn select(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE))
    }

    fn check_filters(filters: &Filters) -> Result<(), RepoError> {
        for (column, _) in filters.iter() {
            if !E::FILTERABLE.contains(column) {
                return Err(RepoError::InvalidArgument(format!(
                    "cannot filter {} by {}",
                    E::TABLE,
                    column
                )));
            }
        }
        Ok(())
    }

    fn check_id(id: i64) -> Result<(), RepoError> {
        if id <= 0 {
            return Err(RepoError::InvalidArgument(format!(
                "invalid {} id: {}",
                E::LABEL.to_lowercase(),
                id
            )));
        }
        Ok(())
    }

    fn not_found(id: i64) -> RepoError {
        RepoError::NotFound(format!("{} with ID {} not found", E::LABEL, id))
    }

    fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, filters: &Filters, search: Option<&str>) {
        let mut clause = " WHERE ";

        for (column, value) in filters.iter() {
            qb.push(clause).push(*column).push(" = ");
            value.clone().push_bind(qb);
            clause = " AND ";
        }

        let term = search.map(str::trim).filter(|s| !s.is_empty());
        if let (Some(term), false) = (term, E::SEARCHABLE.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            qb.push(clause).push("(");
            for (i, column) in E::SEARCHABLE.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    #[instrument(skip_all, fields(table = E::TABLE))]
    pub async fn create(&self, new: E::New) -> Result<E, RepoError> {
        debug!("create");
        let err = |e| RepoError::from_sqlx(E::TABLE, "create", e);

        let columns = new.into_columns().into_inner();
        let now = Utc::now();

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (", E::TABLE));
        for (column, _) in &columns {
            qb.push(*column).push(", ");
        }
        qb.push("created_at, updated_at) VALUES (");
        for (_, value) in columns {
            value.push_bind(&mut qb);
            qb.push(", ");
        }
        qb.push_bind(now)
            .push(", ")
            .push_bind(now)
            .push(") RETURNING ")
            .push(E::COLUMNS.join(", "));

        let mut tx = self.pool.begin().await.map_err(err)?;
        let created = qb
            .build_query_as::<E>()
            .fetch_one(&mut *tx)
            .await
            .map_err(err)?;
        tx.commit().await.map_err(err)?;

        debug!(id = created.id(), "created");
        Ok(created)
    }

    /// First row matching every filter, lowest id first
    #[instrument(skip_all, fields(table = E::TABLE))]
    pub async fn get(&self, filters: &Filters) -> Result<E, RepoError> {
        debug!("get");
        if filters.is_empty() {
            return Err(RepoError::InvalidArgument(
                "at least one filter parameter is required".to_string(),
            ));
        }
        Self::check_filters(filters)?;

        let mut qb = self.select();
        Self::push_predicates(&mut qb, filters, None);
        qb.push(" ORDER BY id LIMIT 1");

        qb.build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::from_sqlx(E::TABLE, "get", e))?
            .ok_or_else(|| RepoError::NotFound(format!("{} not found", E::LABEL)))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<E, RepoError> {
        Self::check_id(id)?;
        self.get(&Filters::by_id(id)).await.map_err(|e| match e {
            RepoError::NotFound(_) => Self::not_found(id),
            other => other,
        })
    }

    #[instrument(skip_all, fields(table = E::TABLE, limit = limit, offset = offset))]
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        filters: &Filters,
        search: Option<&str>,
    ) -> Result<ListResult<E>, RepoError> {
        debug!("list");
        if limit < 0 || offset < 0 {
            return Err(RepoError::InvalidArgument(
                "limit and offset must not be negative".to_string(),
            ));
        }
        Self::check_filters(filters)?;
        let err = |e| RepoError::from_sqlx(E::TABLE, "list", e);

        let mut qb = self.select();
        Self::push_predicates(&mut qb, filters, search);
        qb.push(" ORDER BY ")
            .push(E::ORDER_BY)
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let items = qb.build_query_as::<E>().fetch_all(&self.pool).await.map_err(err)?;

        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", E::TABLE));
        Self::push_predicates(&mut count, filters, search);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(err)?;

        Ok(ListResult { items, total })
    }

    /// Writes the supplied columns and `updated_at`, returns the stored row
    #[instrument(skip_all, fields(table = E::TABLE, id = id))]
    pub async fn update(&self, id: i64, changes: E::Changes) -> Result<E, RepoError> {
        debug!("update");
        Self::check_id(id)?;

        let columns = changes.into_columns();
        if !columns.has_values() {
            return Err(RepoError::NoFieldsToUpdate);
        }
        let err = |e| RepoError::from_sqlx(E::TABLE, "update", e);

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", E::TABLE));
        for (column, value) in columns.into_inner() {
            qb.push(column).push(" = ");
            value.push_bind(&mut qb);
            qb.push(", ");
        }
        qb.push("updated_at = ")
            .push_bind(Utc::now())
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(E::COLUMNS.join(", "));

        let mut tx = self.pool.begin().await.map_err(err)?;
        let updated = qb
            .build_query_as::<E>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(err)?
            .ok_or_else(|| Self::not_found(id))?;
        tx.commit().await.map_err(err)?;

        Ok(updated)
    }

    #[instrument(skip_all, fields(table = E::TABLE, id = id))]
    pub async fn delete(&self, id: i64) -> Result<(), RepoError> {
        debug!("delete");
        Self::check_id(id)?;

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", E::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::from_sqlx(E::TABLE, "delete", e))?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

/// Escapes `LIKE` wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
