use axum::{
    extract::{Path, Query},
    http::HeaderMap,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::user::{STATUS_ACTIVE, STATUS_BLOCKED};
use crate::database::models::UserWithRole;
use crate::database::repository::Page;
use crate::error::ApiError;
use crate::middleware::auth::client_ip;
use crate::middleware::AuthUser;
use crate::services::audit;
use crate::services::roles::{self, RoleChange};
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeForm {
    pub role_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeForm {
    #[serde(default)]
    pub status: String,
}

/// GET /api/admin/users?page=N&status=S
pub async fn list(
    Query(params): Query<UserListParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let per_page = config::config().pagination.admin_per_page;
    let page = params.page.unwrap_or(1).max(1);
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query_as::<_, UserWithRole>(
                "SELECT u.id, u.username, u.email, u.name, u.role_id, r.name AS role_name,
                        u.status, u.created_at
                 FROM \"users\" u JOIN \"roles\" r ON r.id = u.role_id
                 WHERE u.status = $1
                 ORDER BY u.created_at DESC LIMIT $2 OFFSET $3",
            )
            .bind(status)
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(&pool)
            .await?;
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM \"users\" WHERE status = $1")
                    .bind(status)
                    .fetch_one(&pool)
                    .await?;
            (rows, total)
        }
        None => {
            let rows = sqlx::query_as::<_, UserWithRole>(
                "SELECT u.id, u.username, u.email, u.name, u.role_id, r.name AS role_name,
                        u.status, u.created_at
                 FROM \"users\" u JOIN \"roles\" r ON r.id = u.role_id
                 ORDER BY u.created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(per_page)
            .bind((page - 1) * per_page)
            .fetch_all(&pool)
            .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM \"users\"")
                .fetch_one(&pool)
                .await?;
            (rows, total)
        }
    };

    let data = Page {
        rows,
        total,
        page,
        per_page,
    };
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/admin/roles - populates the role-change dropdown
pub async fn list_roles() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let roles = roles::list_roles(&pool).await?;
    Ok(Json(json!({ "success": true, "data": roles })))
}

/// POST /api/admin/users/:id/role
pub async fn change_role(
    Extension(admin): Extension<AuthUser>,
    headers: HeaderMap,
    Path(target_id): Path<i64>,
    Json(form): Json<RoleChangeForm>,
) -> Result<Json<Value>, ApiError> {
    roles::ensure_not_self(admin.user_id, target_id)?;

    let pool = DatabaseManager::pool().await?;
    match roles::change_user_role(&pool, target_id, form.role_id).await? {
        RoleChange::Updated => {
            audit::security(
                &pool,
                Some(admin.user_id),
                &format!("Changed role of user {} to role {}", target_id, form.role_id),
                client_ip(&headers),
            )
            .await;
            Ok(Json(json!({
                "success": true,
                "changed": true,
                "message": "Role updated"
            })))
        }
        RoleChange::NoOp => Ok(Json(json!({
            "success": true,
            "changed": false,
            "message": "User already has that role"
        }))),
        RoleChange::NotFound => Err(ApiError::not_found("User not found")),
        RoleChange::InvalidRole => Err(ApiError::bad_request("Unknown role")),
    }
}

/// POST /api/admin/users/:id/status - active <-> blocked
pub async fn change_status(
    Extension(admin): Extension<AuthUser>,
    headers: HeaderMap,
    Path(target_id): Path<i64>,
    Json(form): Json<StatusChangeForm>,
) -> Result<Json<Value>, ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "status",
        &form.status,
        &[Rule::Required, Rule::OneOf(&[STATUS_ACTIVE, STATUS_BLOCKED])],
    );
    validator.finish()?;

    roles::ensure_not_self(admin.user_id, target_id)?;

    let pool = DatabaseManager::pool().await?;
    let status = form.status.trim();
    match roles::set_user_status(&pool, target_id, status).await? {
        RoleChange::Updated => {
            audit::security(
                &pool,
                Some(admin.user_id),
                &format!("Set status of user {} to {}", target_id, status),
                client_ip(&headers),
            )
            .await;
            Ok(Json(json!({
                "success": true,
                "changed": true,
                "message": "Status updated"
            })))
        }
        RoleChange::NoOp => Ok(Json(json!({
            "success": true,
            "changed": false,
            "message": "User already has that status"
        }))),
        RoleChange::NotFound => Err(ApiError::not_found("User not found")),
        RoleChange::InvalidRole => Err(ApiError::bad_request("Unknown status")),
    }
}
