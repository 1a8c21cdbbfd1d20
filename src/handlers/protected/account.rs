use axum::{response::Json, Extension};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::UserWithRole;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /api/auth/whoami - current account profile with role name
pub async fn whoami(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let profile = sqlx::query_as::<_, UserWithRole>(
        "SELECT u.id, u.username, u.email, u.name, u.role_id, r.name AS role_name,
                u.status, u.created_at
         FROM \"users\" u JOIN \"roles\" r ON r.id = u.role_id
         WHERE u.id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Account not found"))?;

    Ok(Json(json!({ "success": true, "data": profile })))
}
