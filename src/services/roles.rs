use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::role::{Role, ROLE_ADMIN};
use crate::error::ApiError;

/// Outcome of an admin mutation against a user row. `NoOp` means the target
/// exists but already had the requested value; callers decide whether that is
/// worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Updated,
    NoOp,
    NotFound,
    InvalidRole,
}

/// Admins never operate on their own account through these endpoints
pub fn ensure_not_self(actor_id: i64, target_id: i64) -> Result<(), ApiError> {
    if actor_id == target_id {
        Err(ApiError::forbidden(
            "You cannot change your own role or status",
        ))
    } else {
        Ok(())
    }
}

pub async fn is_admin(pool: &PgPool, user_id: i64) -> Result<bool, DatabaseError> {
    let role: Option<String> = sqlx::query_scalar(
        "SELECT r.name FROM \"users\" u JOIN \"roles\" r ON r.id = u.role_id WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(role.as_deref() == Some(ROLE_ADMIN))
}

pub async fn list_roles(pool: &PgPool) -> Result<Vec<Role>, DatabaseError> {
    let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM \"roles\" ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(roles)
}

pub async fn change_user_role(
    pool: &PgPool,
    target_id: i64,
    new_role_id: i64,
) -> Result<RoleChange, DatabaseError> {
    let role_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM \"roles\" WHERE id = $1)")
            .bind(new_role_id)
            .fetch_one(pool)
            .await?;
    if !role_exists {
        return Ok(RoleChange::InvalidRole);
    }

    let result = sqlx::query("UPDATE \"users\" SET role_id = $1 WHERE id = $2 AND role_id <> $1")
        .bind(new_role_id)
        .bind(target_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(RoleChange::Updated);
    }
    distinguish_noop(pool, target_id).await
}

pub async fn set_user_status(
    pool: &PgPool,
    target_id: i64,
    status: &str,
) -> Result<RoleChange, DatabaseError> {
    let result = sqlx::query("UPDATE \"users\" SET status = $1 WHERE id = $2 AND status <> $1")
        .bind(status)
        .bind(target_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(RoleChange::Updated);
    }
    distinguish_noop(pool, target_id).await
}

// Zero affected rows is either a missing target or an unchanged value; the
// source treated both as success, which hid typos in user ids.
async fn distinguish_noop(pool: &PgPool, target_id: i64) -> Result<RoleChange, DatabaseError> {
    let user_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM \"users\" WHERE id = $1)")
            .bind(target_id)
            .fetch_one(pool)
            .await?;
    if user_exists {
        Ok(RoleChange::NoOp)
    } else {
        Ok(RoleChange::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_targeting_is_rejected_by_numeric_id() {
        assert!(ensure_not_self(3, 3).is_err());
        assert!(ensure_not_self(3, 4).is_ok());
        let err = ensure_not_self(1, 1).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
