//! Cookie-backed sessions for the JSON API.
//!
//! The session token travels in an HTTP-only cookie named `token`; an
//! `Authorization: Bearer` header is accepted as well for non-browser
//! clients. [`session_middleware`] verifies it and exposes the caller's
//! workspace through the [`WorkspaceContext`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use super::token::{SessionClaims, TokenService};
use crate::error::{ApiError, forbidden, unauthorized};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Authenticated caller and the workspace every query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceContext {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
}

impl From<SessionClaims> for WorkspaceContext {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            workspace_id: claims.workspace_id,
            email: claims.email,
        }
    }
}

/// Reads the session token from the cookie jar, falling back to a bearer header.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Verifies a session token, mapping failures to the API's 401 responses.
pub fn authenticate(
    tokens: &TokenService,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<SessionClaims, ApiError> {
    let token = session_token(jar, headers).ok_or_else(|| unauthorized(Some("Token not found")))?;

    tokens.verify(&token).map_err(|err| {
        tracing::debug!(error = %err, "Rejected session token");
        unauthorized(Some("Invalid token"))
    })
}

/// Rejects requests without a valid session and attaches a [`WorkspaceContext`].
pub async fn session_middleware(
    State(tokens): State<TokenService>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&tokens, &jar, request.headers())?;
    let context = WorkspaceContext::from(claims);

    tracing::Span::current().record("workspace_id", tracing::field::display(context.workspace_id));
    tracing::debug!(
        user_id = %context.user_id,
        workspace_id = %context.workspace_id,
        "Authenticated session"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for WorkspaceContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<WorkspaceContext>()
            .cloned()
            .ok_or_else(|| forbidden(Some("Workspace not found")))
    }
}

/// Builds the session cookie carrying `token`.
pub fn session_cookie(token: String, ttl_seconds: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_seconds as i64))
        .secure(secure)
        .build()
}

/// Cookie used to remove the session; path must match [`session_cookie`].
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
