//! Registration, login and session handling over HTTP.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{TestApp, body_json, session_cookie};

#[tokio::test]
async fn register_creates_workspace_and_sets_cookie() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            json!({
                "name": "Ana",
                "email": "Ana@Example.com",
                "password": "secret123",
                "workspaceName": "Ana Confeitaria",
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response).expect("session cookie set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert_eq!(body["user"]["workspace"]["name"], "Ana Confeitaria");
    assert!(body["user"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn register_validates_input() -> Result<()> {
    let app = TestApp::new().await?;

    let missing = app
        .post_json(
            "/api/auth/register",
            json!({ "name": "Ana", "email": "ana@example.com", "password": "secret123" }),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["message"], "All fields are required");

    let short = app
        .post_json(
            "/api/auth/register",
            json!({
                "name": "Ana",
                "email": "ana@example.com",
                "password": "12345",
                "workspaceName": "Ana",
            }),
            None,
        )
        .await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let bad_email = app
        .post_json(
            "/api/auth/register",
            json!({
                "name": "Ana",
                "email": "not-an-email",
                "password": "secret123",
                "workspaceName": "Ana",
            }),
            None,
        )
        .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad_email).await["message"], "Invalid email address");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let app = TestApp::new().await?;
    app.register("dup@example.com", "First").await;

    let response = app
        .post_json(
            "/api/auth/register",
            json!({
                "name": "Other",
                "email": "DUP@example.com",
                "password": "secret123",
                "workspaceName": "Second",
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["message"], "Email already in use");
    Ok(())
}

#[tokio::test]
async fn login_accepts_correct_password_only() -> Result<()> {
    let app = TestApp::new().await?;
    app.register("bea@example.com", "Bea Store").await;

    let wrong = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "bea@example.com", "password": "nope-nope" }),
            None,
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await["message"], "Invalid email or password");

    let unknown = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "ghost@example.com", "password": "secret123" }),
            None,
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let ok = app
        .post_json(
            "/api/auth/login",
            json!({ "email": "BEA@example.com", "password": "secret123" }),
            None,
        )
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(session_cookie(&ok).is_some());
    let body = body_json(ok).await;
    assert_eq!(body["user"]["workspace"]["name"], "Bea Store");
    Ok(())
}

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .post_json("/api/auth/login", json!({ "email": "x@example.com" }), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn me_reports_current_user() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("carla@example.com", "Carla Ltda").await;

    let response = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "carla@example.com");
    assert_eq!(body["user"]["workspace"]["name"], "Carla Ltda");

    let anonymous = app.get("/api/auth/me", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let forged = app.get("/api/auth/me", Some("not.a.jwt")).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bearer_header_is_accepted() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("dani@example.com", "Dani").await;

    let response = app
        .send(
            Request::get("/api/clients")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_expires_cookie() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.register("eva@example.com", "Eva").await;

    let response = app
        .post_json("/api/auth/logout", json!({}), Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = session_cookie(&response).expect("removal cookie");
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}
