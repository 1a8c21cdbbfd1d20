use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::SystemLog;
use crate::database::query::{bind_param_as, SelectBuilder};
use crate::database::repository::{fetch_count, Page};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LogListParams {
    pub page: Option<i64>,
    pub log_type: Option<String>,
}

/// GET /api/admin/logs?log_type=T&page=N - append-only, read-only
pub async fn list(Query(params): Query<LogListParams>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let per_page = config::config().pagination.admin_per_page;
    let page = params.page.unwrap_or(1).max(1);

    let mut builder = SelectBuilder::new("system_logs")?;
    if let Some(log_type) = params.log_type.as_deref().filter(|t| !t.trim().is_empty()) {
        builder = builder.and_eq("log_type", log_type.trim())?;
    }

    let total = fetch_count(&pool, &builder.to_count_sql()).await?;
    let sql = builder.order_desc("created_at")?.paginate(page, per_page).to_sql();

    let mut q = sqlx::query_as::<_, SystemLog>(&sql.query);
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
