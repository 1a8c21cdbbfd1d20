use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;

// Read-only dashboard aggregations. Recomputed per request; admins see data
// across all owners by design.

#[derive(Debug, Serialize, FromRow)]
pub struct FarmAnimalCount {
    pub farm_id: i64,
    pub farm_name: String,
    pub batches: i64,
    pub head_count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

pub async fn animals_per_farm(pool: &PgPool) -> Result<Vec<FarmAnimalCount>, DatabaseError> {
    let rows = sqlx::query_as::<_, FarmAnimalCount>(
        "SELECT f.id AS farm_id, f.name AS farm_name,
                COUNT(a.id) AS batches,
                COALESCE(SUM(a.quantity), 0) AS head_count
         FROM \"farms\" f
         LEFT JOIN \"animals\" a ON a.farm_id = f.id
         GROUP BY f.id, f.name
         ORDER BY f.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn animals_by_type(pool: &PgPool) -> Result<Vec<LabelCount>, DatabaseError> {
    let rows = sqlx::query_as::<_, LabelCount>(
        "SELECT animal_type AS label, COALESCE(SUM(quantity), 0) AS count
         FROM \"animals\" GROUP BY animal_type ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn employees_by_position(pool: &PgPool) -> Result<Vec<LabelCount>, DatabaseError> {
    let rows = sqlx::query_as::<_, LabelCount>(
        "SELECT position AS label, COUNT(*) AS count
         FROM \"employees\" GROUP BY position ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn health_records_by_type(pool: &PgPool) -> Result<Vec<LabelCount>, DatabaseError> {
    let rows = sqlx::query_as::<_, LabelCount>(
        "SELECT record_type AS label, COUNT(*) AS count
         FROM \"animal_health_records\" GROUP BY record_type ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub fn salary_bucket(salary: f64) -> &'static str {
    match salary {
        s if s < 25_000.0 => "under_25k",
        s if s < 50_000.0 => "25k_to_50k",
        s if s < 75_000.0 => "50k_to_75k",
        s if s < 100_000.0 => "75k_to_100k",
        _ => "100k_plus",
    }
}

pub fn tenure_bucket(days: i64) -> &'static str {
    match days {
        d if d < 365 => "under_1y",
        d if d < 3 * 365 => "1y_to_3y",
        d if d < 5 * 365 => "3y_to_5y",
        d if d < 10 * 365 => "5y_to_10y",
        _ => "10y_plus",
    }
}

pub async fn salary_histogram(pool: &PgPool) -> Result<BTreeMap<&'static str, i64>, DatabaseError> {
    let salaries: Vec<f64> =
        sqlx::query_scalar("SELECT salary FROM \"employees\" WHERE salary IS NOT NULL")
            .fetch_all(pool)
            .await?;
    let mut histogram = BTreeMap::new();
    for salary in salaries {
        *histogram.entry(salary_bucket(salary)).or_insert(0) += 1;
    }
    Ok(histogram)
}

pub async fn tenure_histogram(pool: &PgPool) -> Result<BTreeMap<&'static str, i64>, DatabaseError> {
    let hire_dates: Vec<NaiveDate> = sqlx::query_scalar("SELECT hire_date FROM \"employees\"")
        .fetch_all(pool)
        .await?;
    let today = Utc::now().date_naive();
    let mut histogram = BTreeMap::new();
    for hire_date in hire_dates {
        let days = (today - hire_date).num_days().max(0);
        *histogram.entry(tenure_bucket(days)).or_insert(0) += 1;
    }
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_bucket_edges() {
        assert_eq!(salary_bucket(0.0), "under_25k");
        assert_eq!(salary_bucket(24_999.99), "under_25k");
        assert_eq!(salary_bucket(25_000.0), "25k_to_50k");
        assert_eq!(salary_bucket(99_999.99), "75k_to_100k");
        assert_eq!(salary_bucket(100_000.0), "100k_plus");
    }

    #[test]
    fn tenure_bucket_edges() {
        assert_eq!(tenure_bucket(0), "under_1y");
        assert_eq!(tenure_bucket(364), "under_1y");
        assert_eq!(tenure_bucket(365), "1y_to_3y");
        assert_eq!(tenure_bucket(3 * 365), "3y_to_5y");
        assert_eq!(tenure_bucket(10 * 365), "10y_plus");
    }
}
