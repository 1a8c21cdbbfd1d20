use axum::response::Json;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::reports;

/// GET /api/admin/reports/farms - batch and head counts per farm
pub async fn farms() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = reports::animals_per_farm(&pool).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// GET /api/admin/reports/animals - head counts by animal type
pub async fn animals() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = reports::animals_by_type(&pool).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

/// GET /api/admin/reports/employees - position, salary and tenure breakdowns
pub async fn employees() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let by_position = reports::employees_by_position(&pool).await?;
    let salary_histogram = reports::salary_histogram(&pool).await?;
    let tenure_histogram = reports::tenure_histogram(&pool).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "by_position": by_position,
            "salary_histogram": salary_histogram,
            "tenure_histogram": tenure_histogram,
        }
    })))
}

/// GET /api/admin/reports/health - record counts by type
pub async fn health() -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let rows = reports::health_records_by_type(&pool).await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}
