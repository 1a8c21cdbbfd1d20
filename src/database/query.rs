use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::FromRow;

use crate::database::manager::DatabaseError;

/// A typed bind parameter. Identifiers are validated and interpolated;
/// everything else travels through these as `$n` placeholders. NULLs carry
/// the column's wire type: `Null` is a text NULL, `OptF64` a numeric one.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    I64(i64),
    F64(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    OptF64(Option<f64>),
    Null,
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::I64(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::I64(v as i64)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::F64(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(v: NaiveDate) -> Self {
        SqlParam::Date(v)
    }
}

impl From<Option<f64>> for SqlParam {
    fn from(v: Option<f64>) -> Self {
        SqlParam::OptF64(v)
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Validate a SQL identifier (table or column name). Identifiers are the only
/// part of a query that cannot be bound as a parameter, so they are checked
/// against a strict charset before being quoted.
pub fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    if name.is_empty() {
        return Err(DatabaseError::QueryError(
            "Identifier cannot be empty".to_string(),
        ));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_alphabetic() || first == '_')
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DatabaseError::QueryError(format!(
            "Invalid identifier format: {}",
            name
        )));
    }
    Ok(())
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Builder for owner-scoped SELECTs: equality conditions ANDed together,
/// optional ordering and pagination, `$n` placeholders with a parallel
/// parameter list.
pub struct SelectBuilder {
    table: String,
    conditions: Vec<(String, SqlParam)>,
    order_by: Option<(String, bool)>, // (column, descending)
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Result<Self, DatabaseError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            table,
            conditions: vec![],
            order_by: None,
            limit: None,
            offset: None,
        })
    }

    pub fn and_eq(
        mut self,
        column: &str,
        value: impl Into<SqlParam>,
    ) -> Result<Self, DatabaseError> {
        validate_identifier(column)?;
        self.conditions.push((column.to_string(), value.into()));
        Ok(self)
    }

    pub fn order_desc(mut self, column: &str) -> Result<Self, DatabaseError> {
        validate_identifier(column)?;
        self.order_by = Some((column.to_string(), true));
        Ok(self)
    }

    pub fn order_asc(mut self, column: &str) -> Result<Self, DatabaseError> {
        validate_identifier(column)?;
        self.order_by = Some((column.to_string(), false));
        Ok(self)
    }

    /// One-based page number with a fixed page size
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        self.limit = Some(per_page);
        self.offset = Some((page - 1) * per_page);
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let mut query = format!("SELECT * FROM {}", quote(&self.table));
        let params = self.push_where(&mut query);
        if let Some((column, desc)) = &self.order_by {
            query.push_str(&format!(
                " ORDER BY {} {}",
                quote(column),
                if *desc { "DESC" } else { "ASC" }
            ));
        }
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => query.push_str(&format!(" LIMIT {} OFFSET {}", l, o)),
            (Some(l), None) => query.push_str(&format!(" LIMIT {}", l)),
            _ => {}
        }
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let mut query = format!("SELECT COUNT(*) AS count FROM {}", quote(&self.table));
        let params = self.push_where(&mut query);
        SqlResult { query, params }
    }

    fn push_where(&self, query: &mut String) -> Vec<SqlParam> {
        let mut params = Vec::with_capacity(self.conditions.len());
        for (i, (column, value)) in self.conditions.iter().enumerate() {
            query.push_str(if i == 0 { " WHERE " } else { " AND " });
            query.push_str(&format!("{} = ${}", quote(column), i + 1));
            params.push(value.clone());
        }
        params
    }
}

pub fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::I64(i) => q.bind(*i),
        SqlParam::F64(f) => q.bind(*f),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s),
        SqlParam::Date(d) => q.bind(*d),
        SqlParam::OptF64(f) => q.bind(*f),
        SqlParam::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
    }
}

pub fn bind_param_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        SqlParam::I64(i) => q.bind(*i),
        SqlParam::F64(f) => q.bind(*f),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s),
        SqlParam::Date(d) => q.bind(*d),
        SqlParam::OptF64(f) => q.bind(*f),
        SqlParam::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
    }
}
