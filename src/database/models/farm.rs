use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::OwnedEntity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Farm {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub location: String,
    pub size: f64,
    pub farm_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OwnedEntity for Farm {
    const TABLE: &'static str = "farms";
}
