use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::setting::SystemSetting;

pub async fn all(pool: &PgPool) -> Result<Vec<SystemSetting>, DatabaseError> {
    let settings = sqlx::query_as::<_, SystemSetting>(
        "SELECT * FROM \"system_settings\" ORDER BY setting_key",
    )
    .fetch_all(pool)
    .await?;
    Ok(settings)
}

pub async fn get(pool: &PgPool, key: &str) -> Result<Option<String>, DatabaseError> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT setting_value FROM \"system_settings\" WHERE setting_key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}

#[derive(Debug, Default, Serialize)]
pub struct BulkUpdateResult {
    pub updated: Vec<String>,
    pub skipped_protected: Vec<String>,
    pub unknown: Vec<String>,
}

/// Split a submitted key/value map against the current settings. Protected
/// rows are dropped even when the request names them; unknown keys are
/// reported, not created.
pub fn partition_updates(
    current: &[SystemSetting],
    submitted: &BTreeMap<String, String>,
) -> (Vec<(String, String)>, BulkUpdateResult) {
    let mut applicable = Vec::new();
    let mut result = BulkUpdateResult::default();

    for (key, value) in submitted {
        match current.iter().find(|s| &s.setting_key == key) {
            None => result.unknown.push(key.clone()),
            Some(setting) if setting.is_protected => {
                result.skipped_protected.push(key.clone());
            }
            Some(_) => applicable.push((key.clone(), value.clone())),
        }
    }

    (applicable, result)
}

/// Bulk settings update. All-or-nothing is not required here; each row
/// updates independently and the guard clause re-checks `is_protected` so a
/// concurrent protect flip cannot be raced.
pub async fn bulk_update(
    pool: &PgPool,
    submitted: &BTreeMap<String, String>,
) -> Result<BulkUpdateResult, DatabaseError> {
    let current = all(pool).await?;
    let (applicable, mut result) = partition_updates(&current, submitted);

    for (key, value) in applicable {
        let outcome = sqlx::query(
            "UPDATE \"system_settings\" SET setting_value = $1, updated_at = now()
             WHERE setting_key = $2 AND is_protected = FALSE",
        )
        .bind(&value)
        .bind(&key)
        .execute(pool)
        .await?;
        if outcome.rows_affected() > 0 {
            result.updated.push(key);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(key: &str, protected: bool) -> SystemSetting {
        SystemSetting {
            id: 1,
            setting_key: key.to_string(),
            setting_value: "x".to_string(),
            description: None,
            is_protected: protected,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn protected_settings_never_appear_in_applicable_set() {
        let current = vec![setting("site_name", false), setting("maintenance_mode", true)];
        let mut submitted = BTreeMap::new();
        submitted.insert("site_name".to_string(), "Orchard".to_string());
        submitted.insert("maintenance_mode".to_string(), "on".to_string());

        let (applicable, result) = partition_updates(&current, &submitted);
        assert_eq!(applicable, vec![("site_name".to_string(), "Orchard".to_string())]);
        assert_eq!(result.skipped_protected, vec!["maintenance_mode".to_string()]);
    }

    #[test]
    fn unknown_keys_are_reported_not_created() {
        let current = vec![setting("site_name", false)];
        let mut submitted = BTreeMap::new();
        submitted.insert("no_such_key".to_string(), "v".to_string());

        let (applicable, result) = partition_updates(&current, &submitted);
        assert!(applicable.is_empty());
        assert_eq!(result.unknown, vec!["no_such_key".to_string()]);
    }
}
