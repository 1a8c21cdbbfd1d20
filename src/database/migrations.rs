use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::query::validate_identifier;

// DDL runs at startup (or via `farmctl migrate`), never on the request path.
// The lock serializes concurrent callers within one process; statements are
// idempotent so a rerun is harmless.
static MIGRATION_LOCK: Mutex<()> = Mutex::const_new(());

/// Ordered table definitions, parents before children
const TABLES: &[(&str, &str)] = &[
    (
        "roles",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "name" TEXT NOT NULL UNIQUE"#,
    ),
    (
        "users",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "username" TEXT NOT NULL UNIQUE,
    "email" TEXT NOT NULL,
    "name" TEXT NOT NULL,
    "password_hash" TEXT NOT NULL,
    "role_id" BIGINT NOT NULL REFERENCES "roles"("id"),
    "status" TEXT NOT NULL DEFAULT 'active',
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "farms",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "user_id" BIGINT NOT NULL REFERENCES "users"("id"),
    "name" TEXT NOT NULL,
    "location" TEXT NOT NULL,
    "size" DOUBLE PRECISION NOT NULL,
    "farm_type" TEXT NOT NULL,
    "description" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "animals",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "farm_id" BIGINT NOT NULL REFERENCES "farms"("id"),
    "user_id" BIGINT NOT NULL REFERENCES "users"("id"),
    "animal_type" TEXT NOT NULL,
    "breed" TEXT,
    "purpose" TEXT,
    "quantity" INTEGER NOT NULL,
    "registration_date" DATE NOT NULL,
    "notes" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "employees",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "farm_id" BIGINT NOT NULL REFERENCES "farms"("id"),
    "user_id" BIGINT NOT NULL REFERENCES "users"("id"),
    "first_name" TEXT NOT NULL,
    "last_name" TEXT NOT NULL,
    "position" TEXT NOT NULL,
    "contact" TEXT,
    "email" TEXT NOT NULL,
    "hire_date" DATE NOT NULL,
    "salary" DOUBLE PRECISION,
    "notes" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "animal_health_records",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "animal_id" BIGINT NOT NULL REFERENCES "animals"("id") ON DELETE CASCADE,
    "user_id" BIGINT NOT NULL REFERENCES "users"("id"),
    "record_date" DATE NOT NULL,
    "record_type" TEXT NOT NULL,
    "description" TEXT NOT NULL,
    "performed_by" TEXT,
    "notes" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "system_settings",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "setting_key" TEXT NOT NULL UNIQUE,
    "setting_value" TEXT NOT NULL,
    "description" TEXT,
    "is_protected" BOOLEAN NOT NULL DEFAULT FALSE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "contact_messages",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "name" TEXT NOT NULL,
    "email" TEXT NOT NULL,
    "subject" TEXT NOT NULL,
    "message" TEXT NOT NULL,
    "status" TEXT NOT NULL DEFAULT 'pending',
    "admin_response" TEXT,
    "responded_by" BIGINT REFERENCES "users"("id"),
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
    (
        "system_logs",
        r#"    "id" BIGSERIAL PRIMARY KEY,
    "log_type" TEXT NOT NULL,
    "user_id" BIGINT REFERENCES "users"("id") ON DELETE SET NULL,
    "message" TEXT NOT NULL,
    "ip_address" TEXT,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()"#,
    ),
];

/// Older deployments predate the denormalized owner columns; derive them from
/// the farm join exactly once when the column is added.
const BACKFILL_ANIMALS_USER_ID: &str = r#"UPDATE "animals" SET "user_id" = "farms"."user_id"
 FROM "farms" WHERE "animals"."farm_id" = "farms"."id" AND "animals"."user_id" IS NULL"#;

const BACKFILL_EMPLOYEES_USER_ID: &str = r#"UPDATE "employees" SET "user_id" = "farms"."user_id"
 FROM "farms" WHERE "employees"."farm_id" = "farms"."id" AND "employees"."user_id" IS NULL"#;

/// Run the full ordered migration set. Idempotent; DDL failures abort the
/// caller (startup or CLI) with the underlying reason in the server log.
pub async fn run(pool: &PgPool) -> Result<(), DatabaseError> {
    let _guard = MIGRATION_LOCK.lock().await;

    for (table, body) in TABLES {
        ensure_table(pool, table, body).await?;
    }

    // Columns introduced after the original tables shipped
    ensure_column(pool, "animals", "user_id", "BIGINT", Some(BACKFILL_ANIMALS_USER_ID)).await?;
    ensure_column(
        pool,
        "employees",
        "user_id",
        "BIGINT",
        Some(BACKFILL_EMPLOYEES_USER_ID),
    )
    .await?;
    ensure_column(
        pool,
        "system_settings",
        "is_protected",
        "BOOLEAN NOT NULL DEFAULT FALSE",
        None,
    )
    .await?;
    ensure_column(
        pool,
        "contact_messages",
        "responded_by",
        "BIGINT REFERENCES \"users\"(\"id\")",
        None,
    )
    .await?;

    seed_roles(pool).await?;
    seed_settings(pool).await?;

    info!("Migrations complete");
    Ok(())
}

/// Idempotent CREATE TABLE IF NOT EXISTS
pub async fn ensure_table(pool: &PgPool, table: &str, body: &str) -> Result<(), DatabaseError> {
    validate_identifier(table)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    let ddl = format!("CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n)", table, body);
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("create table {}: {}", table, e)))?;
    Ok(())
}

/// Idempotent ALTER TABLE ... ADD COLUMN, with an optional one-shot backfill
/// UPDATE run only when the column was actually added.
pub async fn ensure_column(
    pool: &PgPool,
    table: &str,
    column: &str,
    definition: &str,
    backfill: Option<&str>,
) -> Result<(), DatabaseError> {
    validate_identifier(table).map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    validate_identifier(column).map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.columns
         WHERE table_name = $1 AND column_name = $2)",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::Sqlx)?;

    if exists {
        return Ok(());
    }

    let ddl = format!(
        "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}",
        table, column, definition
    );
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .map_err(|e| {
            DatabaseError::MigrationError(format!("add column {}.{}: {}", table, column, e))
        })?;
    info!("Added column {}.{}", table, column);

    if let Some(backfill_sql) = backfill {
        let result = sqlx::query(backfill_sql).execute(pool).await.map_err(|e| {
            DatabaseError::MigrationError(format!("backfill {}.{}: {}", table, column, e))
        })?;
        info!(
            "Backfilled {}.{} ({} rows)",
            table,
            column,
            result.rows_affected()
        );
    }

    Ok(())
}

async fn seed_roles(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("INSERT INTO \"roles\" (\"name\") VALUES ('admin'), ('user') ON CONFLICT (\"name\") DO NOTHING")
        .execute(pool)
        .await?;
    Ok(())
}

/// Default settings; protected rows are never editable through the bulk
/// settings endpoint.
const DEFAULT_SETTINGS: &[(&str, &str, &str, bool)] = &[
    ("site_name", "Farmstead", "Display name shown in page titles", false),
    ("support_email", "support@example.com", "Address shown on the contact page", false),
    ("maintenance_mode", "off", "Reject non-admin traffic while on", true),
    ("schema_version", "2", "Managed by migrations", true),
];

async fn seed_settings(pool: &PgPool) -> Result<(), DatabaseError> {
    for (key, value, description, protected) in DEFAULT_SETTINGS {
        sqlx::query(
            "INSERT INTO \"system_settings\" (\"setting_key\", \"setting_value\", \"description\", \"is_protected\")
             VALUES ($1, $2, $3, $4) ON CONFLICT (\"setting_key\") DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(protected)
        .execute(pool)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_ordered_parents_first() {
        let names: Vec<&str> = TABLES.iter().map(|(name, _)| *name).collect();
        let pos = |n: &str| names.iter().position(|t| *t == n).unwrap();
        assert!(pos("roles") < pos("users"));
        assert!(pos("users") < pos("farms"));
        assert!(pos("farms") < pos("animals"));
        assert!(pos("animals") < pos("animal_health_records"));
        assert!(pos("farms") < pos("employees"));
    }

    #[test]
    fn backfills_derive_owner_from_farm_join() {
        assert!(BACKFILL_ANIMALS_USER_ID.contains("\"farms\".\"user_id\""));
        assert!(BACKFILL_ANIMALS_USER_ID.contains("\"user_id\" IS NULL"));
        assert!(BACKFILL_EMPLOYEES_USER_ID.contains("\"farms\".\"id\""));
    }

    #[test]
    fn system_logs_detach_from_deleted_users() {
        let (_, body) = TABLES.iter().find(|(n, _)| *n == "system_logs").unwrap();
        assert!(body.contains("ON DELETE SET NULL"));
    }

    #[test]
    fn seeded_settings_include_protected_rows() {
        assert!(DEFAULT_SETTINGS.iter().any(|(_, _, _, protected)| *protected));
    }
}
