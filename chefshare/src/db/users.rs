//! Credential store: the auth-relevant surface of the `users` table.

use crate::auth::{
    errors::{AuthError, AuthResult},
    models::{NewUser, ProfileUpdate, User},
};
use sqlx::PgConnection;
use uuid::Uuid;

/// Insert a user with a fresh opaque id.
///
/// # Errors
///
/// * `AuthError::UsernameTaken` - Username exists (case-insensitive)
/// * `AuthError::EmailTaken` - Email exists
pub async fn create(conn: &mut PgConnection, user: &NewUser) -> AuthResult<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (user_id, username, email, password_hash, bio, first_name, last_name, profile_picture)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING user_id, username, email, password_hash, bio, first_name, last_name,
                  profile_picture, email_verified, last_login, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.profile_picture)
    .fetch_one(&mut *conn)
    .await
    .map_err(AuthError::from_unique_violation)
}

/// Look up by normalized email. Absence is `Ok(None)`, not an error.
pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> AuthResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email, password_hash, bio, first_name, last_name,
               profile_picture, email_verified, last_login, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

/// Look up by id. Absence is `Ok(None)`, not an error.
pub async fn find_by_id(conn: &mut PgConnection, user_id: &str) -> AuthResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email, password_hash, bio, first_name, last_name,
               profile_picture, email_verified, last_login, created_at, updated_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

/// Like [`find_by_id`], but row-locks the user for the rest of the transaction.
pub async fn lock_by_id(conn: &mut PgConnection, user_id: &str) -> AuthResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email, password_hash, bio, first_name, last_name,
               profile_picture, email_verified, last_login, created_at, updated_at
        FROM users
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

/// Overwrite the password digest. Session revocation is the caller's job.
pub async fn update_password_hash(
    conn: &mut PgConnection,
    user_id: &str,
    password_hash: &str,
) -> AuthResult<()> {
    let result =
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AuthError::UserNotFound);
    }
    Ok(())
}

pub async fn set_email_verified(
    conn: &mut PgConnection,
    user_id: &str,
    verified: bool,
) -> AuthResult<()> {
    let result =
        sqlx::query("UPDATE users SET email_verified = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(verified)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AuthError::UserNotFound);
    }
    Ok(())
}

pub async fn update_last_login(conn: &mut PgConnection, user_id: &str) -> AuthResult<()> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Case-insensitive username check, optionally ignoring one user (the caller).
pub async fn is_username_taken(
    conn: &mut PgConnection,
    username: &str,
    excluding: Option<&str>,
) -> AuthResult<bool> {
    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM users
            WHERE LOWER(username) = LOWER($1)
              AND ($2::TEXT IS NULL OR user_id <> $2)
        )
        "#,
    )
    .bind(username)
    .bind(excluding)
    .fetch_one(&mut *conn)
    .await?;

    Ok(taken)
}

/// Apply a sparse profile update and return the full post-update row.
///
/// Unset fields keep their stored value. `Ok(None)` when the user is gone.
pub async fn update_profile(
    conn: &mut PgConnection,
    user_id: &str,
    update: &ProfileUpdate,
) -> AuthResult<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            username        = COALESCE($2, username),
            bio             = COALESCE($3, bio),
            first_name      = COALESCE($4, first_name),
            last_name       = COALESCE($5, last_name),
            profile_picture = COALESCE($6, profile_picture),
            updated_at      = NOW()
        WHERE user_id = $1
        RETURNING user_id, username, email, password_hash, bio, first_name, last_name,
                  profile_picture, email_verified, last_login, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(update.username.as_deref())
    .bind(update.bio.as_deref())
    .bind(update.first_name.as_deref())
    .bind(update.last_name.as_deref())
    .bind(update.profile_picture.as_deref())
    .fetch_optional(&mut *conn)
    .await
    .map_err(AuthError::from_unique_violation)
}
