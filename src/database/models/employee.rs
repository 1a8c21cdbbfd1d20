use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::OwnedEntity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub farm_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub contact: Option<String>,
    pub email: String,
    pub hire_date: NaiveDate,
    pub salary: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OwnedEntity for Employee {
    const TABLE: &'static str = "employees";
}
