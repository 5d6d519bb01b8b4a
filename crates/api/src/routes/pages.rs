//! Page Routes: home, index, login, logout

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use session_auth::INVALID_CREDENTIALS_MESSAGE;
use tracing::warn;

use crate::auth::{clear_session_cookie, current_session, set_session_cookie, RequireLogin};
use crate::views::{self, IndexView};
use crate::SharedState;

/// Notice shown after logging out
pub const LOGGED_OUT_MESSAGE: &str = "You were just logged out!";

/// `/` sends users to the form or to the login page
pub async fn home(State(state): State<SharedState>, headers: HeaderMap) -> Redirect {
    if current_session(&headers, &state).is_some() {
        Redirect::to("/index")
    } else {
        Redirect::to("/login")
    }
}

/// Welcome page with the prediction form
pub async fn welcome(RequireLogin(user): RequireLogin) -> Html<String> {
    Html(views::index_page(&IndexView {
        username: &user.username,
        ..Default::default()
    }))
}

/// Query parameters for the login page
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set by the logout redirect
    #[serde(default)]
    pub logged_out: bool,
}

/// Login form submission
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = query.logged_out.then_some(LOGGED_OUT_MESSAGE);
    Html(views::login_page(None, notice))
}

pub async fn login_submit(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth.authenticate(&form.username, &form.password) {
        Ok(issued) => {
            let cookie = set_session_cookie(
                &issued.token,
                state.auth.sessions().ttl_seconds(),
                state.secure_cookie,
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/index")).into_response()
        }
        Err(session_auth::AuthError::InvalidCredentials) => (
            StatusCode::OK,
            Html(views::login_page(Some(INVALID_CREDENTIALS_MESSAGE), None)),
        )
            .into_response(),
        Err(e) => {
            warn!("Login failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::login_page(Some("Login is unavailable right now."), None)),
            )
                .into_response()
        }
    }
}

/// Revokes the current session (if any) and clears the cookie
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(context) = current_session(&headers, &state) {
        if let Err(e) = state.auth.logout(&context) {
            warn!("Could not revoke session {}: {}", context.session_id, e);
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login?logged_out=true"),
    )
        .into_response()
}
