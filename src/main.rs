use axum::{middleware::from_fn, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use farmstead_api::database::manager::DatabaseManager;
use farmstead_api::database::migrations;
use farmstead_api::handlers::public;
use farmstead_api::middleware::{jwt_auth_middleware, require_admin_middleware};
use farmstead_api::config;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Farmstead API in {:?} mode", config.environment);

    // Schema is ensured once here, never on the request path
    let pool = DatabaseManager::pool()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
    migrations::run(&pool)
        .await
        .unwrap_or_else(|e| panic!("migrations failed: {}", e));

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("FARMSTEAD_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Farmstead API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes())
        .merge(admin_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;

    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/auth/register", post(public::auth::register))
        .route("/contact", post(public::contact::create))
}

fn protected_routes() -> Router {
    use axum::routing::get;
    use farmstead_api::handlers::protected::{account, animals, employees, farms, health_records};

    Router::new()
        .route("/api/auth/whoami", get(account::whoami))
        .route("/api/farms", get(farms::list).post(farms::create))
        .route(
            "/api/farms/:id",
            get(farms::show).put(farms::update).delete(farms::remove),
        )
        .route("/api/animals", get(animals::list).post(animals::create))
        .route(
            "/api/animals/:id",
            get(animals::show)
                .put(animals::update)
                .delete(animals::remove),
        )
        .route(
            "/api/employees",
            get(employees::list).post(employees::create),
        )
        .route(
            "/api/employees/:id",
            get(employees::show)
                .put(employees::update)
                .delete(employees::remove),
        )
        .route(
            "/api/animal-health",
            get(health_records::list).post(health_records::create),
        )
        .route(
            "/api/animal-health/:id",
            get(health_records::show)
                .put(health_records::update)
                .delete(health_records::remove),
        )
        .layer(from_fn(jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use axum::routing::{get, post};
    use farmstead_api::handlers::admin::{logs, messages, reports, settings, users};

    Router::new()
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/:id/role", post(users::change_role))
        .route("/api/admin/users/:id/status", post(users::change_status))
        .route("/api/admin/roles", get(users::list_roles))
        .route("/api/admin/logs", get(logs::list))
        .route("/api/admin/contact-messages", get(messages::list))
        .route(
            "/api/admin/contact-messages/:id/respond",
            post(messages::respond),
        )
        .route(
            "/api/admin/settings",
            get(settings::list).post(settings::update),
        )
        .route("/api/admin/reports/farms", get(reports::farms))
        .route("/api/admin/reports/animals", get(reports::animals))
        .route("/api/admin/reports/employees", get(reports::employees))
        .route("/api/admin/reports/health", get(reports::health))
        // Inner layer runs second: admin gate after authentication
        .layer(from_fn(require_admin_middleware))
        .layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Farmstead API",
            "version": version,
            "description": "Farm management backend: farms, livestock, employees, health records",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/login, /auth/register (public)",
                "contact": "/contact (public)",
                "farms": "/api/farms[/:id] (protected)",
                "animals": "/api/animals[/:id] (protected)",
                "employees": "/api/employees[/:id] (protected)",
                "animal_health": "/api/animal-health[/:id] (protected)",
                "admin": "/api/admin/* (admin only)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
