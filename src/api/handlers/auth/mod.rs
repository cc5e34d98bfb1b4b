//! Magic-link, password, session, and dashboard authentication endpoints.

pub mod dashboard;
pub mod password_login;
pub mod send_link;
pub mod session;
pub mod types;
pub mod validate;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::session::{Session, session_cookie};
use anyhow::anyhow;
use axum::http::{HeaderValue, header::SET_COOKIE};
use axum::response::Response;

/// Sign a session and attach it to the response as the session cookie.
pub(super) fn attach_session_cookie(
    state: &AppState,
    session: &Session,
    mut response: Response,
) -> Result<Response, ApiError> {
    let token = state.codec().create(session)?;
    let cookie: HeaderValue = session_cookie(
        &token,
        state.codec().ttl_seconds(),
        state.config().session_cookie_secure(),
    )
    .map_err(|_| anyhow!("failed to build session cookie"))?;
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}
