//! Test utilities for HTTP-level tests.
//!
//! Builds the full router over an in-memory SQLite database and drives it
//! with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use mare::{config::AppConfig, server::{AppState, create_app}};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        ..AppConfig::default()
    }
}

/// Router plus the connection behind it.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let db = setup_test_db().await?;
        let router = create_app(AppState::new(test_config(), db.clone()));
        Ok(Self { router, db })
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, path: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(path);
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, path: &str, body: Value, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Registers a user with their own workspace and returns the session token.
    pub async fn register(&self, email: &str, workspace: &str) -> String {
        let response = self
            .post_json(
                "/api/auth/register",
                json!({
                    "name": "Test User",
                    "email": email,
                    "password": "secret123",
                    "workspaceName": workspace,
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), 201, "registration failed");
        let body = body_json(response).await;
        body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    /// Creates a client and returns its id.
    pub async fn create_client(&self, token: &str, name: &str) -> String {
        let response = self
            .post_json("/api/clients", json!({ "name": name }), Some(token))
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["client"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Creates a stocked product and returns its id.
    pub async fn create_product(&self, token: &str, name: &str, price: f64, quantity: i32) -> String {
        let response = self
            .post_json(
                "/api/products",
                json!({ "name": name, "price": price, "quantity": quantity, "minStock": 2 }),
                Some(token),
            )
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["product"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Value of the `token` cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("token="))
        .map(str::to_string)
}
