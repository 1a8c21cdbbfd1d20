use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::Farm;
use crate::database::query::SqlParam;
use crate::database::repository::{farm_dependents, ListQuery, Repository, UpdateOutcome};
use crate::error::ApiError;
use crate::handlers::{optional_text, parsed_f64};
use crate::middleware::AuthUser;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct FarmForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub farm_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct FarmListParams {
    pub page: Option<i64>,
    pub farm_type: Option<String>,
}

// One rule set for create and edit
fn validate_form(form: &FarmForm) -> Result<(), ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "name",
        &form.name,
        &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(100)],
    );
    validator.check(
        "location",
        &form.location,
        &[Rule::Required, Rule::MaxLength(200)],
    );
    validator.check(
        "size",
        &form.size,
        &[
            Rule::Required,
            Rule::NumericRange {
                min: Some(0.01),
                max: None,
            },
        ],
    );
    validator.check(
        "farm_type",
        &form.farm_type,
        &[Rule::Required, Rule::MaxLength(50)],
    );
    validator.check("description", &form.description, &[Rule::MaxLength(1000)]);
    validator.finish()
}

fn field_values(form: &FarmForm) -> Result<Vec<(&'static str, SqlParam)>, ApiError> {
    let size = parsed_f64(&form.size, "size")?;
    Ok(vec![
        ("name", form.name.trim().into()),
        ("location", form.location.trim().into()),
        ("size", size.into()),
        ("farm_type", form.farm_type.trim().into()),
        ("description", optional_text(&form.description)),
    ])
}

/// GET /api/farms?page=N&farm_type=T
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FarmListParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Farm>::new(pool);

    let mut query = ListQuery::new(params.page, config::config().pagination.farms_per_page);
    if let Some(farm_type) = params.farm_type.as_deref().filter(|t| !t.trim().is_empty()) {
        query = query.with_filter("farm_type", farm_type.trim());
    }

    let page = repo.list_by_owner(user.user_id, &query).await?;
    Ok(Json(json!({ "success": true, "data": page })))
}

/// POST /api/farms
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(form): Json<FarmForm>,
) -> Result<Json<Value>, ApiError> {
    validate_form(&form)?;
    let fields = field_values(&form)?;

    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Farm>::new(pool);
    let id = repo.insert(user.user_id, &fields).await?;
    let farm = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": farm,
        "message": "Farm registered"
    })))
}

/// GET /api/farms/:id
pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Farm>::new(pool);
    let farm = repo.get_by_id_for_owner(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": farm })))
}

/// PUT /api/farms/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<FarmForm>,
) -> Result<Json<Value>, ApiError> {
    validate_form(&form)?;
    let fields = field_values(&form)?;

    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Farm>::new(pool);

    // Resolve NotFound before the write so a missing row is not reported as
    // an unchanged one
    repo.get_by_id_for_owner(id, user.user_id).await?;
    let outcome = repo.update(id, user.user_id, &fields).await?;
    let farm = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": farm,
        "changed": outcome == UpdateOutcome::Updated,
        "message": "Farm updated"
    })))
}

/// DELETE /api/farms/:id - guarded by dependent animals and employees
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Farm>::new(pool.clone());

    repo.get_by_id_for_owner(id, user.user_id).await?;

    let (animals, employees) = farm_dependents(&pool, id).await?;
    if animals > 0 || employees > 0 {
        return Err(ApiError::HasDependents { animals, employees });
    }

    repo.delete(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Farm deleted" })))
}
