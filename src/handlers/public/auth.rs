use axum::{http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, password, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::role::ROLE_USER;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::auth::client_ip;
use crate::services::audit;
use crate::validate::{FormValidator, Rule};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// POST /auth/login - exchange credentials for a session token
pub async fn login(
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> Result<Json<Value>, ApiError> {
    let mut validator = FormValidator::new();
    validator.check("username", &form.username, &[Rule::Required]);
    validator.check("password", &form.password, &[Rule::Required]);
    validator.finish()?;

    let pool = DatabaseManager::pool().await?;
    let ip = client_ip(&headers);

    let user = sqlx::query_as::<_, User>("SELECT * FROM \"users\" WHERE username = $1")
        .bind(form.username.trim())
        .fetch_optional(&pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            audit::security(
                &pool,
                None,
                &format!("Failed login for unknown username {:?}", form.username.trim()),
                ip,
            )
            .await;
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    if !password::verify(&form.password, &user.password_hash) {
        audit::security(&pool, Some(user.id), "Failed login (bad password)", ip).await;
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    // Blocked accounts are refused a token outright
    if user.is_blocked() {
        audit::security(&pool, Some(user.id), "Blocked account attempted login", ip).await;
        return Err(ApiError::forbidden("Account is blocked"));
    }

    let role: String = sqlx::query_scalar("SELECT name FROM \"roles\" WHERE id = $1")
        .bind(user.role_id)
        .fetch_one(&pool)
        .await?;

    let token = generate_jwt(Claims::new(user.id, role.clone()))?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": {
                "id": user.id,
                "username": user.username,
                "name": user.name,
                "role": role,
            },
            "expires_in": expires_in,
        }
    })))
}

/// POST /auth/register - create an account with the default role
pub async fn register(
    headers: HeaderMap,
    Json(form): Json<RegisterForm>,
) -> Result<Json<Value>, ApiError> {
    let mut validator = FormValidator::new();
    validator.check(
        "username",
        &form.username,
        &[
            Rule::Required,
            Rule::MinLength(3),
            Rule::MaxLength(50),
            Rule::Regex {
                pattern: r"^[A-Za-z0-9_]+$",
                message: "Only letters, numbers and underscores are allowed",
            },
        ],
    );
    validator.check("email", &form.email, &[Rule::Required, Rule::Email]);
    validator.check(
        "name",
        &form.name,
        &[Rule::Required, Rule::MaxLength(100)],
    );
    validator.check(
        "password",
        &form.password,
        &[Rule::Required, Rule::MinLength(8)],
    );
    validator.check(
        "password_confirm",
        &form.password_confirm,
        &[
            Rule::Required,
            Rule::MatchField {
                other: form.password.clone(),
                message: "Passwords do not match",
            },
        ],
    );

    let pool = DatabaseManager::pool().await?;

    let username = form.username.trim().to_string();
    if validator.is_valid() {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM \"users\" WHERE username = $1)")
                .bind(&username)
                .fetch_one(&pool)
                .await?;
        if taken {
            validator.add_error("username", "Username is already taken");
        }
    }
    validator.finish()?;

    let role_id: i64 = sqlx::query_scalar("SELECT id FROM \"roles\" WHERE name = $1")
        .bind(ROLE_USER)
        .fetch_one(&pool)
        .await?;

    let salt = password::generate_salt(&username);
    let password_hash = password::hash(&form.password, &salt);

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO \"users\" (\"username\", \"email\", \"name\", \"password_hash\", \"role_id\")
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&username)
    .bind(form.email.trim())
    .bind(form.name.trim())
    .bind(&password_hash)
    .bind(role_id)
    .fetch_one(&pool)
    .await?;

    audit::info(
        &pool,
        Some(user_id),
        &format!("New account registered: {}", username),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "data": { "id": user_id, "username": username }
    })))
}
