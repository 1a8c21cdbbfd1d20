use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const LOG_TYPES: &[&str] = &["info", "warning", "error", "security"];

/// Append-only; rows are never updated or deleted through the application
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemLog {
    pub id: i64,
    pub log_type: String,
    pub user_id: Option<i64>,
    pub message: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
