use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// POST /contact - public contact form; messages start out pending
pub async fn create(Json(form): Json<ContactForm>) -> Result<Json<Value>, ApiError> {
    let mut validator = FormValidator::new();
    validator.check("name", &form.name, &[Rule::Required, Rule::MaxLength(100)]);
    validator.check("email", &form.email, &[Rule::Required, Rule::Email]);
    validator.check(
        "subject",
        &form.subject,
        &[Rule::Required, Rule::MaxLength(200)],
    );
    validator.check(
        "message",
        &form.message,
        &[Rule::Required, Rule::MinLength(10), Rule::MaxLength(5000)],
    );
    validator.finish()?;

    let pool = DatabaseManager::pool().await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO \"contact_messages\" (\"name\", \"email\", \"subject\", \"message\")
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(form.name.trim())
    .bind(form.email.trim())
    .bind(form.subject.trim())
    .bind(form.message.trim())
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "id": id },
        "message": "Thanks for reaching out. We will get back to you soon."
    })))
}
