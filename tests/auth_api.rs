//! Login, session and registration flows against a real database.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use coachline::models::session::Session;
use common::{build_test_app, create_test_user, send, TEST_PASSWORD};

const NO_GATEWAY: &str = "http://127.0.0.1:9";

async fn login(pool: &PgPool, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_issues_day_long_session(pool: PgPool) {
    let user = create_test_user(&pool, "ada@example.com").await;

    // Lookup is case-insensitive on email
    let (status, body) = login(&pool, "ADA@example.com", TEST_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let expires_at: DateTime<Utc> = body["expires_at"].as_str().unwrap().parse().unwrap();
    let ttl = expires_at - Utc::now();
    assert!(ttl > Duration::hours(23) && ttl <= Duration::hours(24));

    let session = Session::find_by_token(&pool, token).await.unwrap().unwrap();
    assert_eq!(session.user_id, user.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_bad_credentials(pool: PgPool) {
    create_test_user(&pool, "ada@example.com").await;

    let (status, body) = login(&pool, "ada@example.com", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, body) = login(&pool, "nobody@example.com", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_inactive_user(pool: PgPool) {
    let user = create_test_user(&pool, "ada@example.com").await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = login(&pool, "ada@example.com", TEST_PASSWORD).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_current_user_and_logout(pool: PgPool) {
    create_test_user(&pool, "ada@example.com").await;
    let (_, body) = login(&pool, "ada@example.com", TEST_PASSWORD).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, body) = send(app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, _) = send(app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(Session::find_by_token(&pool, &token).await.unwrap().is_none());

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, _) = send(app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_session_is_rejected_and_removed(pool: PgPool) {
    let user = create_test_user(&pool, "ada@example.com").await;
    let token = "a".repeat(64);
    Session::create(&pool, user.id, &token, Duration::hours(-1))
        .await
        .unwrap();

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, body) = send(app, Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(Session::find_by_token(&pool, &token).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logout_with_unknown_token_is_no_content(pool: PgPool) {
    let (app, _) = build_test_app(pool, NO_GATEWAY);

    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/logout",
        Some("does-not-exist"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_then_duplicate_is_conflict(pool: PgPool) {
    let request = json!({
        "email": "Bola@Example.com",
        "password": "long-enough-password",
        "full_name": "Bola Ade"
    });

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, body) = send(app, Method::POST, "/api/auth/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "bola@example.com");

    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "bola@example.com",
            "password": "another-password",
            "full_name": "Someone Else"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // The registered password works
    let (status, _) = login(&pool, "bola@example.com", "long-enough-password").await;
    assert_eq!(status, StatusCode::OK);
}
