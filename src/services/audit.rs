use sqlx::PgPool;

// Persistent audit trail in system_logs, alongside the tracing output.
// Append-only; a failed audit write never fails the request that caused it.

pub async fn log(
    pool: &PgPool,
    log_type: &str,
    user_id: Option<i64>,
    message: &str,
    ip_address: Option<String>,
) {
    let result = sqlx::query(
        "INSERT INTO \"system_logs\" (\"log_type\", \"user_id\", \"message\", \"ip_address\")
         VALUES ($1, $2, $3, $4)",
    )
    .bind(log_type)
    .bind(user_id)
    .bind(message)
    .bind(ip_address)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!("Failed to write audit log entry: {}", e);
    }
}

pub async fn security(pool: &PgPool, user_id: Option<i64>, message: &str, ip: Option<String>) {
    tracing::warn!(user_id = ?user_id, "{}", message);
    log(pool, "security", user_id, message, ip).await;
}

pub async fn info(pool: &PgPool, user_id: Option<i64>, message: &str, ip: Option<String>) {
    tracing::info!(user_id = ?user_id, "{}", message);
    log(pool, "info", user_id, message, ip).await;
}
