//! Redirects for browser page navigation.
//!
//! Only cookie presence is checked here; the token itself is verified by
//! the API session middleware.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::session::SESSION_COOKIE;

const PUBLIC_PAGES: &[&str] = &["/login", "/register"];

/// Paths the guard never touches.
fn is_excluded(path: &str) -> bool {
    path.starts_with("/api")
        || path.starts_with("/docs")
        || path.starts_with("/health")
        || path == "/openapi.json"
        || path == "/favicon.ico"
}

/// Sends signed-in users away from the login pages and everyone else to `/login`.
pub async fn page_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_excluded(path) {
        return next.run(request).await;
    }

    let has_session = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| !cookie.value().is_empty());
    let is_public = PUBLIC_PAGES.contains(&path);

    match (has_session, is_public) {
        (true, true) => Redirect::temporary("/").into_response(),
        (false, false) => Redirect::temporary("/login").into_response(),
        _ => next.run(request).await,
    }
}
