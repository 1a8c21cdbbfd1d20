use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_BLOCKED: &str = "blocked";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == STATUS_BLOCKED
    }
}

/// Admin listing row: user joined with its role name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserWithRole {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role_id: i64,
    pub role_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
