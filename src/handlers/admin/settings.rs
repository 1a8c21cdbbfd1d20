use std::collections::BTreeMap;

use axum::{http::HeaderMap, response::Json, Extension};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::auth::client_ip;
use crate::middleware::AuthUser;
use crate::services::{audit, settings};

/// GET /api/admin/settings
pub async fn list() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = settings::all(&pool).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// POST /api/admin/settings - bulk key/value update; protected rows are
/// skipped even when the request names them
pub async fn update(
    Extension(admin): Extension<AuthUser>,
    headers: HeaderMap,
    Json(submitted): Json<BTreeMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    if submitted.is_empty() {
        return Err(ApiError::bad_request("No settings submitted"));
    }

    let pool = DatabaseManager::pool().await?;
    let result = settings::bulk_update(&pool, &submitted).await?;

    if !result.updated.is_empty() {
        audit::info(
            &pool,
            Some(admin.user_id),
            &format!("Updated settings: {}", result.updated.join(", ")),
            client_ip(&headers),
        )
        .await;
    }

    Ok(Json(json!({
        "success": true,
        "data": result,
        "message": "Settings saved"
    })))
}
