use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::OwnedEntity;

pub const RECORD_TYPES: &[&str] = &["checkup", "vaccination", "treatment", "medication", "other"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthRecord {
    pub id: i64,
    pub animal_id: i64,
    pub user_id: i64,
    pub record_date: NaiveDate,
    pub record_type: String,
    pub description: String,
    pub performed_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedEntity for HealthRecord {
    const TABLE: &'static str = "animal_health_records";
    const HAS_UPDATED_AT: bool = true;
}
