use sqlx::{self, postgres::PgRow, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::query::{
    bind_param, bind_param_as, validate_identifier, SelectBuilder, SqlParam, SqlResult,
};

/// A row type that belongs to exactly one user. Every query the repository
/// issues filters on `OWNER_COLUMN`; rows are never addressed by id alone.
pub trait OwnedEntity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str = "user_id";
    /// Tables carrying an `updated_at` column get it bumped on every update
    const HAS_UPDATED_AT: bool = false;
}

/// Distinguishes a real update from one that matched no row (wrong id, wrong
/// owner, or values identical under a conditional update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NoOp,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Listing parameters: one-based page, fixed page size, optional equality
/// filters (status, type, parent id) re-applied verbatim from the query string.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: i64,
    pub per_page: i64,
    pub filters: Vec<(&'static str, SqlParam)>,
}

impl ListQuery {
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page,
            filters: vec![],
        }
    }

    pub fn with_filter(mut self, column: &'static str, value: impl Into<SqlParam>) -> Self {
        self.filters.push((column, value.into()));
        self
    }
}

pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: OwnedEntity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        query: &ListQuery,
    ) -> Result<Page<T>, DatabaseError> {
        let mut builder = SelectBuilder::new(T::TABLE)?.and_eq(T::OWNER_COLUMN, owner_id)?;
        for (column, value) in &query.filters {
            builder = builder.and_eq(column, value.clone())?;
        }

        let total = fetch_count(&self.pool, &builder.to_count_sql()).await?;

        let sql = builder
            .order_desc("created_at")?
            .paginate(query.page, query.per_page)
            .to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;

        Ok(Page {
            rows,
            total,
            page: query.page,
            per_page: query.per_page,
        })
    }

    /// Absent and foreign rows are indistinguishable to the caller
    pub async fn get_by_id_for_owner(&self, id: i64, owner_id: i64) -> Result<T, DatabaseError> {
        let sql = SelectBuilder::new(T::TABLE)?
            .and_eq("id", id)?
            .and_eq(T::OWNER_COLUMN, owner_id)?
            .to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_as(q, p);
        }
        match q.fetch_optional(&self.pool).await? {
            Some(row) => Ok(row),
            None => Err(DatabaseError::NotFound("Record not found".to_string())),
        }
    }

    pub async fn insert(
        &self,
        owner_id: i64,
        fields: &[(&str, SqlParam)],
    ) -> Result<i64, DatabaseError> {
        let mut columns = vec![format!("\"{}\"", T::OWNER_COLUMN)];
        let mut placeholders = vec!["$1".to_string()];
        let mut params: Vec<SqlParam> = vec![owner_id.into()];
        for (column, value) in fields {
            validate_identifier(column)?;
            columns.push(format!("\"{}\"", column));
            placeholders.push(format!("${}", params.len() + 1));
            params.push(value.clone());
        }

        let query = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING id",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut q = sqlx::query(&query);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let id: i64 = row.try_get("id")?;
        Ok(id)
    }

    pub async fn update(
        &self,
        id: i64,
        owner_id: i64,
        fields: &[(&str, SqlParam)],
    ) -> Result<UpdateOutcome, DatabaseError> {
        if fields.is_empty() {
            return Ok(UpdateOutcome::NoOp);
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut params: Vec<SqlParam> = Vec::with_capacity(fields.len() + 2);
        for (column, value) in fields {
            validate_identifier(column)?;
            assignments.push(format!("\"{}\" = ${}", column, params.len() + 1));
            params.push(value.clone());
        }
        if T::HAS_UPDATED_AT {
            assignments.push("\"updated_at\" = now()".to_string());
        }

        let query = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${} AND \"{}\" = ${}",
            T::TABLE,
            assignments.join(", "),
            params.len() + 1,
            T::OWNER_COLUMN,
            params.len() + 2,
        );
        params.push(id.into());
        params.push(owner_id.into());

        let mut q = sqlx::query(&query);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            Ok(UpdateOutcome::NoOp)
        } else {
            Ok(UpdateOutcome::Updated)
        }
    }

    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let query = format!(
            "DELETE FROM \"{}\" WHERE \"id\" = $1 AND \"{}\" = $2",
            T::TABLE,
            T::OWNER_COLUMN
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Ownership check for dropdown-selected parent ids (farm_id, animal_id):
/// the row must exist and belong to the caller.
pub async fn owned_parent_exists(
    pool: &PgPool,
    table: &str,
    id: i64,
    owner_id: i64,
) -> Result<bool, DatabaseError> {
    validate_identifier(table)?;
    let query = format!(
        "SELECT COUNT(*) AS count FROM \"{}\" WHERE \"id\" = $1 AND \"user_id\" = $2",
        table
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
    let count: i64 = row.try_get("count")?;
    Ok(count > 0)
}

/// Dependent row counts guarding farm deletion
pub async fn farm_dependents(pool: &PgPool, farm_id: i64) -> Result<(i64, i64), DatabaseError> {
    let animals: i64 =
        sqlx::query("SELECT COUNT(*) AS count FROM \"animals\" WHERE \"farm_id\" = $1")
            .bind(farm_id)
            .fetch_one(pool)
            .await?
            .try_get("count")?;
    let employees: i64 =
        sqlx::query("SELECT COUNT(*) AS count FROM \"employees\" WHERE \"farm_id\" = $1")
            .bind(farm_id)
            .fetch_one(pool)
            .await?
            .try_get("count")?;
    Ok((animals, employees))
}

pub async fn fetch_count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let row = q.fetch_one(pool).await?;
    let count: i64 = row.try_get("count")?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_clamps_page() {
        let q = ListQuery::new(Some(0), 10);
        assert_eq!(q.page, 1);
        let q = ListQuery::new(None, 10);
        assert_eq!(q.page, 1);
        let q = ListQuery::new(Some(4), 10);
        assert_eq!(q.page, 4);
    }

    #[test]
    fn with_filter_appends_typed_params() {
        let q = ListQuery::new(Some(1), 10)
            .with_filter("status", "pending")
            .with_filter("farm_id", 3i64);
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[1].1, SqlParam::I64(3));
    }
}
