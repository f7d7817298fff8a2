//! # Authentication Handlers
//!
//! Registration, login, logout and the current-user endpoint. Successful
//! register/login responses set the `token` session cookie and also return
//! the token in the body.

use std::sync::OnceLock;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use metrics::counter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{self, hash_password, removal_cookie, session_cookie, verify_password};
use crate::error::{ApiError, ErrorType, bad_request, forbidden, unauthorized};
use crate::handlers::types::non_blank;
use crate::models::{user, workspace};
use crate::repositories::{UserRepository, user::NewRegistration};
use crate::server::AppState;

const MIN_PASSWORD_LEN: usize = 6;

/// Registration payload
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "Ana Souza")]
    pub name: Option<String>,
    #[schema(example = "ana@example.com")]
    pub email: Option<String>,
    #[schema(example = "segredo123")]
    pub password: Option<String>,
    #[schema(example = "Loja da Ana")]
    pub workspace_name: Option<String>,
}

/// Login payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@teste.com")]
    pub email: Option<String>,
    #[schema(example = "123456")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceDto {
    pub id: String,
    pub name: String,
}

impl From<workspace::Model> for WorkspaceDto {
    fn from(workspace: workspace::Model) -> Self {
        Self {
            id: workspace.id.to_string(),
            name: workspace.name,
        }
    }
}

/// The signed-in user and the workspace the session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub workspace: Option<WorkspaceDto>,
}

impl UserDto {
    fn new(user: user::Model, workspace: Option<workspace::Model>) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            workspace: workspace.map(WorkspaceDto::from),
        }
    }
}

/// Body returned by register and login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Session token; also set as the `token` cookie
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserDto,
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|pattern| pattern.is_match(email))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a user together with a new workspace
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User and workspace created; session cookie set", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields", body = ApiError),
        (status = 409, description = "Email already in use", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(name), Some(email), Some(password), Some(workspace_name)) = (
        non_blank(request.name),
        non_blank(request.email),
        request.password.filter(|p| !p.is_empty()),
        non_blank(request.workspace_name),
    ) else {
        return Err(bad_request("All fields are required"));
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(bad_request("Invalid email address"));
    }

    let password_hash = hash_password(password)
        .await
        .map_err(anyhow::Error::from)?;

    let repo = UserRepository::new(&state.db);
    let (user, workspace) = repo
        .register(NewRegistration {
            name,
            email,
            password_hash,
            workspace_name,
        })
        .await?;

    let token = state
        .tokens
        .issue(user.id, &user.email, workspace.id)
        .map_err(anyhow::Error::from)?;

    counter!("mare_registrations_total").increment(1);

    let jar = jar.add(session_cookie(
        token.clone(),
        state.tokens.ttl_seconds(),
        state.config.cookie_secure(),
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            token,
            user: UserDto::new(user, Some(workspace)),
        }),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ApiError),
        (status = 401, description = "Invalid email or password", body = ApiError),
        (status = 403, description = "User has no active workspace", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(email), Some(password)) = (
        non_blank(request.email),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(bad_request("Email and password are required"));
    };

    let repo = UserRepository::new(&state.db);
    let Some(user) = repo.find_by_email(&normalize_email(&email)).await? else {
        counter!("mare_logins_total", "outcome" => "rejected").increment(1);
        return Err(unauthorized(Some("Invalid email or password")));
    };

    let valid = verify_password(password, user.password_hash.clone())
        .await
        .map_err(anyhow::Error::from)?;
    if !valid {
        counter!("mare_logins_total", "outcome" => "rejected").increment(1);
        tracing::info!(user_id = %user.id, "Rejected login attempt");
        return Err(unauthorized(Some("Invalid email or password")));
    }

    let Some(workspace) = repo.primary_workspace(user.id).await? else {
        return Err(forbidden(Some("User has no active workspace")));
    };

    let token = state
        .tokens
        .issue(user.id, &user.email, workspace.id)
        .map_err(anyhow::Error::from)?;

    counter!("mare_logins_total", "outcome" => "success").increment(1);
    tracing::info!(user_id = %user.id, workspace_id = %workspace.id, "User signed in");

    let jar = jar.add(session_cookie(
        token.clone(),
        state.tokens.ttl_seconds(),
        state.config.cookie_secure(),
    ));

    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: UserDto::new(user, Some(workspace)),
        }),
    ))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cookie cleared")),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, jar.remove(removal_cookie()))
}

/// Return the user behind the current session
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid session token", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let claims = auth::authenticate(&state.tokens, &jar, &headers)?;

    let repo = UserRepository::new(&state.db);
    let Some(user) = repo.find_by_id(claims.sub).await? else {
        return Err(ErrorType::NotFound.with_message("User not found"));
    };
    let workspace = repo.primary_workspace(user.id).await?;

    Ok(Json(MeResponse {
        user: UserDto::new(user, workspace),
    }))
}
