//! Identity lifecycle tests over the real router.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let (app, _state) = test_app();

    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "A@X.com",
            "password": TEST_PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    // Email is normalized, the password never leaves the server.
    assert_eq!(body["data"]["user"]["email"], json!("a@x.com"));
    assert_eq!(body["data"]["user"]["role"], json!("user"));
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["token"].as_str().is_some());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _state) = test_app();
    register_user(&app, "a@x.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "a@x.com", "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_register_validates_email_and_password() {
    let (app, _state) = test_app();

    let (status, _) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "a@x.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_bad_credentials() {
    let (app, _state) = test_app();
    register_user(&app, "a@x.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some());

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown account reads the same as a bad password.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@x.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_inactive_account() {
    let (app, state) = test_app();
    let (_, user_id) = register_user(&app, "a@x.com").await;

    {
        let conn = state.db.get().unwrap();
        conn.execute(
            "UPDATE users SET is_active = 0 WHERE id = ?1",
            rusqlite::params![user_id],
        )
        .unwrap();
    }

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_requires_valid_bearer() {
    let (app, _state) = test_app();
    let (token, _) = register_user(&app, "a@x.com").await;

    let (status, body) = request(&app, "POST", "/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some());

    let (status, _) = request(&app, "POST", "/auth/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "POST", "/auth/refresh", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_does_not_leak_existence() {
    let (app, _state) = test_app();
    register_user(&app, "known@x.com").await;

    let (known_status, known_body) = request(
        &app,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "known@x.com" })),
    )
    .await;
    let (unknown_status, unknown_body) = request(
        &app,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "unknown@x.com" })),
    )
    .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_reset_password_end_to_end() {
    let (app, state) = test_app();
    let (_, user_id) = register_user(&app, "a@x.com").await;

    // Plant a reset token directly; the email path only logs in tests.
    let token = crypto::generate_token();
    {
        let conn = state.db.get().unwrap();
        queries::create_password_reset(&conn, &user_id, &crypto::hash_token(&token)).unwrap();
    }

    let (status, _) = request(
        &app,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "password": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "brand-new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The token is single-use.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "password": "another-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
