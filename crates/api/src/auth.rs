//! Request-scoped authentication
//!
//! Handlers that need a logged-in user take [`RequireLogin`] (HTML pages,
//! redirects to `/login`) or [`RequireToken`] (JSON API, answers 401).

use crate::error::ApiError;
use crate::SharedState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::Redirect;
use session_auth::AuthContext;
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Value of the session cookie, if present
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Token from an `Authorization: Bearer` header, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Verified session of the request, from the cookie or a bearer token
pub fn current_session(headers: &HeaderMap, state: &SharedState) -> Option<AuthContext> {
    let token = session_cookie(headers).or_else(|| bearer_token(headers))?;
    match state.auth.verify(token) {
        Ok(context) => Some(context),
        Err(e) => {
            debug!("Rejected session token: {}", e);
            None
        }
    }
}

/// `Set-Cookie` value carrying a new session
pub fn set_session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age,
        if secure { "; Secure" } else { "" }
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Logged-in user for HTML routes
pub struct RequireLogin(pub AuthContext);

#[async_trait]
impl FromRequestParts<SharedState> for RequireLogin {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        current_session(&parts.headers, state)
            .map(RequireLogin)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Logged-in user for JSON routes
pub struct RequireToken(pub AuthContext);

#[async_trait]
impl FromRequestParts<SharedState> for RequireToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        current_session(&parts.headers, state)
            .map(RequireToken)
            .ok_or(ApiError::Unauthorized)
    }
}
