//! Token ledger: access tokens revoked before their natural expiry.
//!
//! Entries are keyed by the token's SHA-256 fingerprint and expire with the
//! token, so the table never holds anything that could still matter after
//! the token itself is dead.

use crate::auth::errors::AuthResult;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

/// Record a fingerprint. Re-blacklisting the same token is a no-op.
pub async fn insert(
    conn: &mut PgConnection,
    token_hash: &str,
    user_id: Option<&str>,
    expires_at: DateTime<Utc>,
) -> AuthResult<()> {
    sqlx::query(
        r#"
        INSERT INTO token_blacklist (token_hash, user_id, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (token_hash) DO NOTHING
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn contains(conn: &mut PgConnection, token_hash: &str) -> AuthResult<bool> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE token_hash = $1 AND expires_at > NOW())",
    )
    .bind(token_hash)
    .fetch_one(&mut *conn)
    .await?;

    Ok(found)
}

pub async fn delete_expired(conn: &mut PgConnection) -> AuthResult<u64> {
    let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at <= NOW()")
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
