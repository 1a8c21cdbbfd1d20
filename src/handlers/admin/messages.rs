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
use crate::database::models::contact_message::{ContactMessage, STATUS_ANSWERED, STATUS_PENDING};
use crate::database::query::{bind_param_as, SelectBuilder};
use crate::database::repository::{fetch_count, Page};
use crate::error::ApiError;
use crate::middleware::auth::client_ip;
use crate::middleware::AuthUser;
use crate::services::audit;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct MessageListParams {
    pub page: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondForm {
    #[serde(default)]
    pub response: String,
}

/// GET /api/admin/contact-messages?status=S&page=N
pub async fn list(Query(params): Query<MessageListParams>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let per_page = config::config().pagination.admin_per_page;
    let page = params.page.unwrap_or(1).max(1);

    let mut builder = SelectBuilder::new("contact_messages")?;
    if let Some(status) = params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        builder = builder.and_eq("status", status.trim())?;
    }

    let total = fetch_count(&pool, &builder.to_count_sql()).await?;
    let sql = builder.order_desc("created_at")?.paginate(page, per_page).to_sql();

    let mut q = sqlx::query_as::<_, ContactMessage>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_as(q, p);
    }
    let rows = q.fetch_all(&pool).await?;

    let data = Page {
        rows,
        total,
        page,
        per_page,
    };
    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /api/admin/contact-messages/:id/respond
///
/// One-way transition: the update only matches pending rows, so answering an
/// already-answered message hits zero rows and surfaces a conflict instead of
/// overwriting the first response.
pub async fn respond(
    Extension(admin): Extension<AuthUser>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(form): Json<RespondForm>,
) -> Result<Json<Value>, ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "response",
        &form.response,
        &[Rule::Required, Rule::MaxLength(5000)],
    );
    validator.finish()?;

    let pool = DatabaseManager::pool().await?;
    let result = sqlx::query(
        "UPDATE \"contact_messages\"
         SET status = $1, admin_response = $2, responded_by = $3, updated_at = now()
         WHERE id = $4 AND status = $5",
    )
    .bind(STATUS_ANSWERED)
    .bind(form.response.trim())
    .bind(admin.user_id)
    .bind(id)
    .bind(STATUS_PENDING)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM \"contact_messages\" WHERE id = $1)")
                .bind(id)
                .fetch_one(&pool)
                .await?;
        return if exists {
            Err(ApiError::conflict("Message has already been answered"))
        } else {
            Err(ApiError::not_found("Message not found"))
        };
    }

    audit::info(
        &pool,
        Some(admin.user_id),
        &format!("Responded to contact message {}", id),
        client_ip(&headers),
    )
    .await;

    let message = sqlx::query_as::<_, ContactMessage>(
        "SELECT * FROM \"contact_messages\" WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": message,
        "message": "Response sent"
    })))
}
