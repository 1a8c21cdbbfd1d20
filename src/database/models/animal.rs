use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::OwnedEntity;

/// A batch of animals sharing type, breed and purpose; quantity is the batch
/// head count, not an individual tag.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Animal {
    pub id: i64,
    pub farm_id: i64,
    pub user_id: i64,
    pub animal_type: String,
    pub breed: Option<String>,
    pub purpose: Option<String>,
    pub quantity: i32,
    pub registration_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OwnedEntity for Animal {
    const TABLE: &'static str = "animals";
}
