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
use crate::database::models::health_record::{HealthRecord, RECORD_TYPES};
use crate::database::query::SqlParam;
use crate::database::repository::{owned_parent_exists, ListQuery, Repository, UpdateOutcome};
use crate::error::ApiError;
use crate::handlers::{optional_text, parsed_date, parsed_i64};
use crate::middleware::AuthUser;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct HealthRecordForm {
    #[serde(default)]
    pub animal_id: String,
    #[serde(default)]
    pub record_date: String,
    #[serde(default)]
    pub record_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub performed_by: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthRecordListParams {
    pub page: Option<i64>,
    pub animal_id: Option<i64>,
    pub record_type: Option<String>,
}

async fn validate_form(
    pool: &PgPool,
    user_id: i64,
    form: &HealthRecordForm,
) -> Result<(), ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "animal_id",
        &form.animal_id,
        &[
            Rule::Required,
            Rule::Regex {
                pattern: r"^[0-9]+$",
                message: "Select an animal batch",
            },
        ],
    );
    validator.check(
        "record_date",
        &form.record_date,
        &[
            Rule::Required,
            Rule::DateValid {
                not_future: true,
                not_past: false,
            },
        ],
    );
    validator.check(
        "record_type",
        &form.record_type,
        &[Rule::Required, Rule::OneOf(RECORD_TYPES)],
    );
    validator.check(
        "description",
        &form.description,
        &[Rule::Required, Rule::MaxLength(2000)],
    );
    validator.check(
        "performed_by",
        &form.performed_by,
        &[Rule::MaxLength(100)],
    );
    validator.check("notes", &form.notes, &[Rule::MaxLength(1000)]);

    if !validator.errors().contains_key("animal_id") {
        if let Ok(animal_id) = form.animal_id.trim().parse::<i64>() {
            if !owned_parent_exists(pool, "animals", animal_id, user_id).await? {
                validator.add_error("animal_id", "Selected animal batch was not found");
            }
        }
    }

    validator.finish()
}

fn field_values(form: &HealthRecordForm) -> Result<Vec<(&'static str, SqlParam)>, ApiError> {
    let animal_id = parsed_i64(&form.animal_id, "animal_id")?;
    let record_date = parsed_date(&form.record_date, "record_date")?;
    Ok(vec![
        ("animal_id", animal_id.into()),
        ("record_date", record_date.into()),
        ("record_type", form.record_type.trim().into()),
        ("description", form.description.trim().into()),
        ("performed_by", optional_text(&form.performed_by)),
        ("notes", optional_text(&form.notes)),
    ])
}

/// GET /api/animal-health?page=N&animal_id=A&record_type=T
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HealthRecordListParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<HealthRecord>::new(pool);

    let mut query = ListQuery::new(
        params.page,
        config::config().pagination.health_records_per_page,
    );
    if let Some(animal_id) = params.animal_id {
        query = query.with_filter("animal_id", animal_id);
    }
    if let Some(record_type) = params.record_type.as_deref().filter(|t| !t.trim().is_empty()) {
        query = query.with_filter("record_type", record_type.trim());
    }

    let page = repo.list_by_owner(user.user_id, &query).await?;
    Ok(Json(json!({ "success": true, "data": page })))
}

/// POST /api/animal-health
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(form): Json<HealthRecordForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<HealthRecord>::new(pool);
    let id = repo.insert(user.user_id, &fields).await?;
    let record = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": record,
        "message": "Health record added"
    })))
}

/// GET /api/animal-health/:id
pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<HealthRecord>::new(pool);
    let record = repo.get_by_id_for_owner(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": record })))
}

/// PUT /api/animal-health/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<HealthRecordForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<HealthRecord>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    let outcome = repo.update(id, user.user_id, &fields).await?;
    let record = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": record,
        "changed": outcome == UpdateOutcome::Updated,
        "message": "Health record updated"
    })))
}

/// DELETE /api/animal-health/:id
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<HealthRecord>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    repo.delete(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Health record deleted" })))
}
