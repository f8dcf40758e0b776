//! Integration tests for refresh-token rotation and the token ledger.

mod common;

use chefshare::auth::{AuthError, ClientInfo};
use chefshare::db::refresh_tokens;
use chefshare::maintenance;
use chrono::{Duration, Utc};
use common::{harness, unique_identity};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_rotation_kills_old_token() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    let rotated = h
        .auth
        .refresh(&session.tokens.refresh_token)
        .await
        .expect("First refresh should succeed");

    assert_ne!(rotated.refresh_token, session.tokens.refresh_token);
    assert!(
        h.tokens
            .validate_access_token(&rotated.access_token)
            .await
            .is_ok()
    );

    let replay = h.auth.refresh(&session.tokens.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::InvalidRefreshToken)));

    // The replacement is itself single use
    assert!(h.auth.refresh(&rotated.refresh_token).await.is_ok());
    assert!(h.auth.refresh(&rotated.refresh_token).await.is_err());

    h.cleanup(&email).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_concurrent_refresh_has_exactly_one_winner() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;
    let token = session.tokens.refresh_token.clone();

    let attempts: Vec<_> = (0..4)
        .map(|_| {
            let auth = h.auth.clone();
            let token = token.clone();
            tokio::spawn(async move { auth.refresh(&token).await })
        })
        .collect();

    let mut successes = 0;
    let mut rejections = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::InvalidRefreshToken) => rejections += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rejections, 3);
    assert_eq!(h.count("refresh_tokens", &session.user.user_id).await, 1);

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_expired_token_looks_missing() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    let mut conn = h.db.pool().acquire().await.unwrap();
    refresh_tokens::insert(
        &mut conn,
        &session.user.user_id,
        "expired-refresh-token-value",
        Utc::now() - Duration::minutes(1),
        &ClientInfo::default(),
    )
    .await
    .unwrap();
    drop(conn);

    let expired = h.auth.refresh("expired-refresh-token-value").await;
    let missing = h.auth.refresh("never-issued-token-value").await;
    assert!(matches!(expired, Err(AuthError::InvalidRefreshToken)));
    assert!(matches!(missing, Err(AuthError::InvalidRefreshToken)));

    let swept = maintenance::sweep_tokens(h.db.pool()).await.unwrap();
    assert!(swept.refresh_tokens >= 1);
    assert_eq!(h.count("refresh_tokens", &session.user.user_id).await, 1);

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_rotation_carries_client_metadata() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    let rotated = h.auth.refresh(&session.tokens.refresh_token).await.unwrap();

    let (ip, agent): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT ip_address, user_agent FROM refresh_tokens WHERE token = $1",
    )
    .bind(&rotated.refresh_token)
    .fetch_one(h.db.pool())
    .await
    .unwrap();

    assert_eq!(ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(agent.as_deref(), Some("test-agent"));

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_revoke_refresh_token_reports_missing() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    h.tokens
        .revoke_refresh_token(&session.tokens.refresh_token)
        .await
        .expect("First revoke should succeed");

    let again = h
        .tokens
        .revoke_refresh_token(&session.tokens.refresh_token)
        .await;
    assert!(matches!(again, Err(AuthError::InvalidRefreshToken)));

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_blacklisting_garbage_still_records_entry() {
    let h = harness().await;

    h.tokens
        .blacklist_access_token("not.a.jwt")
        .await
        .expect("Blacklisting an unparseable token should still succeed");

    let validate = h.tokens.validate_access_token("not.a.jwt").await;
    assert!(matches!(validate, Err(AuthError::TokenRevoked)));

    let expires_at: chrono::DateTime<Utc> = sqlx::query_scalar(
        "SELECT expires_at FROM token_blacklist WHERE token_hash = $1",
    )
    .bind(chefshare::auth::codes::fingerprint("not.a.jwt"))
    .fetch_one(h.db.pool())
    .await
    .unwrap();
    assert!(expires_at > Utc::now() + Duration::hours(23));

    sqlx::query("DELETE FROM token_blacklist WHERE token_hash = $1")
        .bind(chefshare::auth::codes::fingerprint("not.a.jwt"))
        .execute(h.db.pool())
        .await
        .unwrap();
}
