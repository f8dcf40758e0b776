//! One-time code ledger: password reset OTPs.

use super::{unit_of_work::UnitOfWork, users};
use crate::auth::{
    codes,
    errors::{AuthError, AuthResult},
    models::PasswordResetCode,
};
use chrono::{Duration, Utc};
use sqlx::PgConnection;

/// Issue a fresh OTP for a user, dropping every earlier code they hold.
///
/// Runs inside the caller's unit of work so the delete and the insert land
/// together. The user row is locked first, so concurrent issuers for the same
/// user queue up and at most one code per user is ever outstanding.
pub async fn create(
    uow: &mut UnitOfWork,
    user_id: &str,
    ttl: Duration,
) -> AuthResult<PasswordResetCode> {
    users::lock_by_id(&mut **uow, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    sqlx::query("DELETE FROM password_reset_codes WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **uow)
        .await?;

    let row = sqlx::query_as::<_, PasswordResetCode>(
        r#"
        INSERT INTO password_reset_codes (user_id, code, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, code, expires_at, used, created_at
        "#,
    )
    .bind(user_id)
    .bind(codes::generate_otp())
    .bind(Utc::now() + ttl)
    .fetch_one(&mut **uow)
    .await?;

    Ok(row)
}

/// Newest code with this value belonging to this user, row-locked.
///
/// Used and expired rows are returned too; judging liveness is the caller's
/// job so every rejection can be reported the same way.
pub async fn find_by_code(
    conn: &mut PgConnection,
    user_id: &str,
    code: &str,
) -> AuthResult<Option<PasswordResetCode>> {
    let row = sqlx::query_as::<_, PasswordResetCode>(
        r#"
        SELECT id, user_id, code, expires_at, used, created_at
        FROM password_reset_codes
        WHERE user_id = $1 AND code = $2
        ORDER BY created_at DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn mark_used(conn: &mut PgConnection, id: i64) -> AuthResult<()> {
    sqlx::query("UPDATE password_reset_codes SET used = TRUE WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn delete_expired(conn: &mut PgConnection) -> AuthResult<u64> {
    let result = sqlx::query("DELETE FROM password_reset_codes WHERE expires_at <= NOW()")
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
