//! Token ledger: refresh tokens.
//!
//! Revocation deletes the row. A token is usable exactly while its row exists
//! and `expires_at` is in the future.

use crate::auth::{
    errors::AuthResult,
    models::{ClientInfo, RefreshToken},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

pub async fn insert(
    conn: &mut PgConnection,
    user_id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    client: &ClientInfo,
) -> AuthResult<RefreshToken> {
    let row = sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO refresh_tokens (token, user_id, expires_at, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, token, user_id, expires_at, created_at, ip_address, user_agent
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .bind(client.ip_address.as_deref())
    .bind(client.user_agent.as_deref())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

/// Consume a live token: delete it and return what was deleted.
///
/// Expired rows are not matched, so they look exactly like missing ones.
/// Two transactions racing on the same token serialize on the row lock; the
/// loser re-evaluates after the winner commits, finds nothing, and gets
/// `None`.
pub async fn take_live(conn: &mut PgConnection, token: &str) -> AuthResult<Option<RefreshToken>> {
    let row = sqlx::query_as::<_, RefreshToken>(
        r#"
        DELETE FROM refresh_tokens
        WHERE token = $1 AND expires_at > NOW()
        RETURNING id, token, user_id, expires_at, created_at, ip_address, user_agent
        "#,
    )
    .bind(token)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Delete one token. Returns whether a row existed.
pub async fn delete(conn: &mut PgConnection, token: &str) -> AuthResult<bool> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_all_for_user(conn: &mut PgConnection, user_id: &str) -> AuthResult<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_expired(conn: &mut PgConnection) -> AuthResult<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
