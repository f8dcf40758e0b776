//! Integration tests for the OTP password reset flow.

mod common;

use chefshare::auth::{AuthError, ClientInfo, LoginRequest, PasswordResetConfirm};
use chefshare::security::RateLimitConfig;
use common::{PASSWORD, harness, harness_with_limit, unique_identity};
use serial_test::serial;
use std::time::Duration;

const NEW_PASSWORD: &str = "Fr3sh&basil";

fn confirm(email: &str, otp: &str, password: &str) -> PasswordResetConfirm {
    PasswordResetConfirm {
        email: email.to_string(),
        otp: otp.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_reset_revokes_every_session() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let code = h.next_reset_code(&email, None).await;
    assert_eq!(code.len(), 6);

    h.auth
        .confirm_password_reset(confirm(&email, &code, NEW_PASSWORD))
        .await
        .expect("Reset should succeed");

    assert_eq!(h.count("refresh_tokens", &session.user.user_id).await, 0);
    assert!(matches!(
        h.auth.refresh(&session.tokens.refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));

    let relogin = h
        .auth
        .login(
            LoginRequest {
                email: email.clone(),
                password: NEW_PASSWORD.to_string(),
            },
            &ClientInfo::default(),
        )
        .await;
    assert!(relogin.is_ok());

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_code_is_single_use() {
    let h = harness().await;
    let (username, email) = unique_identity();
    h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let code = h.next_reset_code(&email, None).await;

    h.auth
        .confirm_password_reset(confirm(&email, &code, NEW_PASSWORD))
        .await
        .unwrap();

    let replay = h
        .auth
        .confirm_password_reset(confirm(&email, &code, "An0ther!pass"))
        .await;
    assert!(matches!(replay, Err(AuthError::InvalidOrExpiredOtp)));

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_resend_invalidates_previous_code() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let first = h.next_reset_code(&email, None).await;

    // The generator may repeat a value; retry until the codes differ
    let mut second = first.clone();
    for _ in 0..5 {
        h.auth.resend_password_reset(&email).await.unwrap();
        second = h.next_reset_code(&email, Some(&second)).await;
        if second != first {
            break;
        }
    }
    assert_ne!(first, second);
    assert_eq!(h.count("password_reset_codes", &session.user.user_id).await, 1);

    let stale = h
        .auth
        .confirm_password_reset(confirm(&email, &first, NEW_PASSWORD))
        .await;
    assert!(matches!(stale, Err(AuthError::InvalidOrExpiredOtp)));

    h.auth
        .confirm_password_reset(confirm(&email, &second, NEW_PASSWORD))
        .await
        .expect("Newest code should work");

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_expired_code_rejected_uniformly() {
    let h = harness().await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let code = h.next_reset_code(&email, None).await;

    sqlx::query("UPDATE password_reset_codes SET expires_at = NOW() - INTERVAL '1 minute' WHERE user_id = $1")
        .bind(&session.user.user_id)
        .execute(h.db.pool())
        .await
        .unwrap();

    let expired = h
        .auth
        .confirm_password_reset(confirm(&email, &code, NEW_PASSWORD))
        .await
        .unwrap_err();
    let wrong = h
        .auth
        .confirm_password_reset(confirm(&email, "000000", NEW_PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(expired, AuthError::InvalidOrExpiredOtp));
    assert_eq!(expired.client_message(), wrong.client_message());

    // Password untouched
    let still_old = h
        .auth
        .login(
            LoginRequest {
                email: email.clone(),
                password: PASSWORD.to_string(),
            },
            &ClientInfo::default(),
        )
        .await;
    assert!(still_old.is_ok());

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_code_bound_to_its_owner() {
    let h = harness().await;
    let (alice, alice_email) = unique_identity();
    let (bob, bob_email) = unique_identity();
    h.register(&alice, &alice_email).await;
    h.register(&bob, &bob_email).await;

    h.auth.request_password_reset(&alice_email).await.unwrap();
    let alice_code = h.next_reset_code(&alice_email, None).await;

    let stolen = h
        .auth
        .confirm_password_reset(confirm(&bob_email, &alice_code, NEW_PASSWORD))
        .await;
    assert!(matches!(stolen, Err(AuthError::InvalidOrExpiredOtp)));

    h.cleanup(&alice_email).await;
    h.cleanup(&bob_email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_unknown_email_gets_same_response_and_no_code() {
    let h = harness().await;
    let email = format!("nobody_{}@example.com", uuid::Uuid::new_v4().simple());

    h.auth
        .request_password_reset(&email)
        .await
        .expect("Unknown email must look like success");
    h.auth.resend_password_reset(&email).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.notifier.sent_to(&email).is_empty());

    let confirm_unknown = h
        .auth
        .confirm_password_reset(confirm(&email, "123456", NEW_PASSWORD))
        .await;
    assert!(matches!(confirm_unknown, Err(AuthError::UserNotFound)));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_confirm_validates_before_lookup() {
    let h = harness().await;

    for (email, otp, password) in [
        ("bad-email", "123456", NEW_PASSWORD),
        ("a@example.com", "12345", NEW_PASSWORD),
        ("a@example.com", "12a456", NEW_PASSWORD),
        ("a@example.com", "123456", "short1!"),
    ] {
        let err = h
            .auth
            .confirm_password_reset(confirm(email, otp, password))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)), "got {:?}", err);
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_email_gate() {
    let h = harness_with_limit(RateLimitConfig::new(1, Duration::from_secs(3_600))).await;
    let (username, email) = unique_identity();
    let session = h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let code = h.next_reset_code(&email, None).await;

    // Over the limit: still Ok, but nothing new is issued
    h.auth.request_password_reset(&email).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.notifier.last_reset_code(&email).as_deref(), Some(code.as_str()));
    assert_eq!(h.count("password_reset_codes", &session.user.user_id).await, 1);

    // Confirm is told explicitly
    let limited = h
        .auth
        .confirm_password_reset(confirm(&email, &code, NEW_PASSWORD))
        .await;
    assert!(matches!(limited, Err(AuthError::RateLimited(_))));

    h.cleanup(&email).await;
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn test_concurrent_confirms_consume_code_once() {
    let h = harness().await;
    let (username, email) = unique_identity();
    h.register(&username, &email).await;

    h.auth.request_password_reset(&email).await.unwrap();
    let code = h.next_reset_code(&email, None).await;

    let (a, b) = tokio::join!(
        h.auth
            .confirm_password_reset(confirm(&email, &code, NEW_PASSWORD)),
        h.auth
            .confirm_password_reset(confirm(&email, &code, "An0ther!pass")),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AuthError::InvalidOrExpiredOtp)))
    );

    h.cleanup(&email).await;
}
