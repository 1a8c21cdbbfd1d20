use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

/// Fixed page sizes per entity listing. Filters and page numbers come from
/// the query string; page size does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub farms_per_page: i64,
    pub animals_per_page: i64,
    pub employees_per_page: i64,
    pub health_records_per_page: i64,
    pub admin_per_page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, individual env vars override
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        if let Ok(v) = env::var("PAGINATION_FARMS_PER_PAGE") {
            self.pagination.farms_per_page = v.parse().unwrap_or(self.pagination.farms_per_page);
        }
        if let Ok(v) = env::var("PAGINATION_ANIMALS_PER_PAGE") {
            self.pagination.animals_per_page =
                v.parse().unwrap_or(self.pagination.animals_per_page);
        }
        if let Ok(v) = env::var("PAGINATION_EMPLOYEES_PER_PAGE") {
            self.pagination.employees_per_page =
                v.parse().unwrap_or(self.pagination.employees_per_page);
        }
        if let Ok(v) = env::var("PAGINATION_HEALTH_RECORDS_PER_PAGE") {
            self.pagination.health_records_per_page =
                v.parse().unwrap_or(self.pagination.health_records_per_page);
        }
        if let Ok(v) = env::var("PAGINATION_ADMIN_PER_PAGE") {
            self.pagination.admin_per_page = v.parse().unwrap_or(self.pagination.admin_per_page);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            pagination: PaginationConfig::standard(),
            security: SecurityConfig {
                // Development fallback only; real deployments set JWT_SECRET
                jwt_secret: "farmstead-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            pagination: PaginationConfig::standard(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            pagination: PaginationConfig::standard(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl PaginationConfig {
    fn standard() -> Self {
        Self {
            farms_per_page: 10,
            animals_per_page: 20,
            employees_per_page: 20,
            health_records_per_page: 20,
            admin_per_page: 20,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.farms_per_page, 10);
        assert_eq!(config.pagination.animals_per_page, 20);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn production_defaults_have_no_baked_in_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }
}
