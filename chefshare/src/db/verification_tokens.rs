//! One-time code ledger: email verification tokens.
//!
//! Single use by existence: confirming deletes the row.

use super::{unit_of_work::UnitOfWork, users};
use crate::auth::{
    codes,
    errors::{AuthError, AuthResult},
    models::VerificationToken,
};
use chrono::{Duration, Utc};
use sqlx::PgConnection;

/// Replace any outstanding verification token for the user with a new one.
///
/// Serialized per user through the user row lock.
pub async fn create(
    uow: &mut UnitOfWork,
    user_id: &str,
    ttl: Duration,
) -> AuthResult<VerificationToken> {
    users::lock_by_id(&mut **uow, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    sqlx::query("DELETE FROM email_verification_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **uow)
        .await?;

    let row = sqlx::query_as::<_, VerificationToken>(
        r#"
        INSERT INTO email_verification_tokens (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, token, expires_at, created_at
        "#,
    )
    .bind(user_id)
    .bind(codes::generate_verification_token()?)
    .bind(Utc::now() + ttl)
    .fetch_one(&mut **uow)
    .await?;

    Ok(row)
}

/// Lookup by token value, expired rows included.
///
/// Not locked: callers lock the owning user first and then rely on
/// [`delete`] reporting whether the row was still there.
pub async fn find_by_token(
    conn: &mut PgConnection,
    token: &str,
) -> AuthResult<Option<VerificationToken>> {
    let row = sqlx::query_as::<_, VerificationToken>(
        r#"
        SELECT id, user_id, token, expires_at, created_at
        FROM email_verification_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Delete one token. Returns `false` if it was already gone.
pub async fn delete(conn: &mut PgConnection, id: i64) -> AuthResult<bool> {
    let result = sqlx::query("DELETE FROM email_verification_tokens WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete_expired(conn: &mut PgConnection) -> AuthResult<u64> {
    let result = sqlx::query("DELETE FROM email_verification_tokens WHERE expires_at <= NOW()")
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
