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
use crate::database::models::Employee;
use crate::database::query::SqlParam;
use crate::database::repository::{owned_parent_exists, ListQuery, Repository, UpdateOutcome};
use crate::error::ApiError;
use crate::handlers::{optional_text, parsed_date, parsed_f64, parsed_i64};
use crate::middleware::AuthUser;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct EmployeeForm {
    #[serde(default)]
    pub farm_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub hire_date: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeListParams {
    pub page: Option<i64>,
    pub farm_id: Option<i64>,
    pub position: Option<String>,
}

// One rule set for registration and edit; the source applied different
// strictness to each, which made records valid or invalid depending on which
// form last touched them.
async fn validate_form(pool: &PgPool, user_id: i64, form: &EmployeeForm) -> Result<(), ApiError> {
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
        "first_name",
        &form.first_name,
        &[Rule::Required, Rule::MaxLength(50)],
    );
    validator.check(
        "last_name",
        &form.last_name,
        &[Rule::Required, Rule::MaxLength(50)],
    );
    validator.check(
        "position",
        &form.position,
        &[Rule::Required, Rule::MaxLength(100)],
    );
    validator.check(
        "contact",
        &form.contact,
        &[Rule::Regex {
            pattern: r"^[0-9+()\-\s]{7,20}$",
            message: "Must be a valid phone number",
        }],
    );
    validator.check("email", &form.email, &[Rule::Required, Rule::Email]);
    validator.check(
        "hire_date",
        &form.hire_date,
        &[
            Rule::Required,
            Rule::DateValid {
                not_future: true,
                not_past: false,
            },
        ],
    );
    validator.check(
        "salary",
        &form.salary,
        &[Rule::NumericRange {
            min: Some(0.0),
            max: None,
        }],
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

fn field_values(form: &EmployeeForm) -> Result<Vec<(&'static str, SqlParam)>, ApiError> {
    let farm_id = parsed_i64(&form.farm_id, "farm_id")?;
    let hire_date = parsed_date(&form.hire_date, "hire_date")?;
    let salary: Option<f64> = if form.salary.trim().is_empty() {
        None
    } else {
        Some(parsed_f64(&form.salary, "salary")?)
    };
    Ok(vec![
        ("farm_id", farm_id.into()),
        ("first_name", form.first_name.trim().into()),
        ("last_name", form.last_name.trim().into()),
        ("position", form.position.trim().into()),
        ("contact", optional_text(&form.contact)),
        ("email", form.email.trim().into()),
        ("hire_date", hire_date.into()),
        ("salary", salary.into()),
        ("notes", optional_text(&form.notes)),
    ])
}

/// GET /api/employees?page=N&farm_id=F&position=P
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EmployeeListParams>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Employee>::new(pool);

    let mut query = ListQuery::new(params.page, config::config().pagination.employees_per_page);
    if let Some(farm_id) = params.farm_id {
        query = query.with_filter("farm_id", farm_id);
    }
    if let Some(position) = params.position.as_deref().filter(|p| !p.trim().is_empty()) {
        query = query.with_filter("position", position.trim());
    }

    let page = repo.list_by_owner(user.user_id, &query).await?;
    Ok(Json(json!({ "success": true, "data": page })))
}

/// POST /api/employees
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(form): Json<EmployeeForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<Employee>::new(pool);
    let id = repo.insert(user.user_id, &fields).await?;
    let employee = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": employee,
        "message": "Employee registered"
    })))
}

/// GET /api/employees/:id
pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Employee>::new(pool);
    let employee = repo.get_by_id_for_owner(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": employee })))
}

/// PUT /api/employees/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(form): Json<EmployeeForm>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    validate_form(&pool, user.user_id, &form).await?;
    let fields = field_values(&form)?;

    let repo = Repository::<Employee>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    let outcome = repo.update(id, user.user_id, &fields).await?;
    let employee = repo.get_by_id_for_owner(id, user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": employee,
        "changed": outcome == UpdateOutcome::Updated,
        "message": "Employee updated"
    })))
}

/// DELETE /api/employees/:id
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let repo = Repository::<Employee>::new(pool);
    repo.get_by_id_for_owner(id, user.user_id).await?;
    repo.delete(id, user.user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Employee removed" })))
}
