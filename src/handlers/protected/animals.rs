use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::Animal;
use crate::database::query::SqlParam;
use crate::database::repository::{owned_parent_exists, ListQuery, Repository, UpdateOutcome};
use crate::error::ApiError;
use crate::handlers::{optional_text, parsed_date, parsed_i32, parsed_i64};
use crate::middleware::AuthUser;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct AnimalForm {
    #[serde(default)]
    pub farm_id: String,
    #[serde(default)]
    pub animal_type: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub registration_date: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct AnimalListParams {
    pub page: Option<i64>,
    pub farm_id: Option<i64>,
    pub animal_type: Option<String>,
}

// One rule set for create and edit. The farm ownership check joins the same
// error map as the field rules so a bad dropdown value renders like any other
// field error.
async fn validate_form(pool: &PgPool, user_id: i64, form: &AnimalForm) -> Result<(), ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "farm_id",
        &form.farm_id,
        &[
            Rule::Required,
            Rule::Regex {
                pattern: r"^[0-9]+$",
                message: "Select a farm",
            },
        ],
    );
    validator.check(
        "animal_type",
        &form.animal_type,
        &[Rule::Required, Rule::MaxLength(50)],
    );
    validator.check("breed", &form.breed, &[Rule::MaxLength(50)]);
    validator.check("purpose", &form.purpose, &[Rule::MaxLength(100)]);
    validator.check(
        "quantity",
        &form.quantity,
        &[
            Rule::Required,
            Rule::Regex {
                pattern: r"^[0-9]+$",
                message: "Must be a whole number",
            },
            Rule::NumericRange {
                min: Some(1.0),
                max: Some(1000.0),
            },
        ],
    );
    validator.check(
        "registration_date",
        &form.registration_date,
        &[
            Rule::Required,
            Rule::DateValid {
                not_future: true,
                not_past: false,
            },
        ],
    );
    validator.check("notes", &form.notes, &[Rule::MaxLength(1000)]);

    if !validator.errors().contains_key("farm_id") {
        if let Ok(farm_id) = form.farm_id.trim().parse::<i64>() {
            if !owned_parent_exists(pool, "farms", farm_id, user_id).await? {
                validator.add_error("farm_id", "Selected farm was not found");
            }
        }
    }

    validator.finish()
}

fn field_values(form: &AnimalForm) -> Result<Vec<(&'static str, SqlParam)>, ApiError> {
    let farm_id = parsed_i64(&form.farm_id, "farm_id")?;
    let quantity = parsed_i32(&form.quantity, "quantity")?;
    let registration_date = parsed_date(&form.registration_date, "registration_date")?;
    Ok(vec![
        ("farm_id", farm_id.into()),
        ("animal_type", form.animal_type.trim().into()),
        ("breed", optional_text(&form.breed)),
        ("purpose", optional_text(&form.purpose)),
        ("quantity", quantity.into()),
        ("registration_date", registration_date.into()),
        ("notes", optional_text(&form.notes)),
    ])
}

/// GET /api/animals?page=N&farm_id=F&animal_type=T
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AnimalListParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Animal>::new(pool);

    let mut query = ListQuery::new(params.page, config::config().pagination.animals_per_page);
    if let Some(farm_id) = params.farm_id {
        query = query.with_filter("farm_id", farm_id);
    }
    if let Some(animal_type) = params.animal_type.as_deref().filter(|t| !t.trim().is_empty()) {
        query = query.with_filter("animal_type", animal_type.trim());
    }

    let page = repo.list_by_owner(user.user_id, &query).await?;
    Ok(Json(json!({ "success": true, "data": page })))
}

/// POST /api/animals
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(form): Json<AnimalForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<Animal>::new(pool);
    let id = repo.insert(user.user_id, &fields).await?;
    let animal = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": animal,
        "message": "Animal batch registered"
    })))
}

/// GET /api/animals/:id
pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Animal>::new(pool);
    let animal = repo.get_by_id_for_owner(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": animal })))
}

/// PUT /api/animals/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<AnimalForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<Animal>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    let outcome = repo.update(id, user.user_id, &fields).await?;
    let animal = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": animal,
        "changed": outcome == UpdateOutcome::Updated,
        "message": "Animal batch updated"
    })))
}

/// DELETE /api/animals/:id - health records cascade with the batch
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Animal>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    repo.delete(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Animal batch deleted" })))
}
