use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
