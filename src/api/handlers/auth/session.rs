//! Session introspection and logout.

use super::types::SessionResponse;
use crate::api::state::AppState;
use crate::auth::session::{clear_session_cookie, extract_session_token};
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // A missing or invalid cookie is just "no session"; nothing to leak.
    let verified = extract_session_token(&headers).and_then(|token| state.codec().verify(&token));
    match verified {
        Some(session) => (
            StatusCode::OK,
            Json(SessionResponse {
                email: session.email,
                role: session.role,
                submission_id: session.submission_id,
            }),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // Tokens are stateless, so logout is purely clearing the cookie.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.config().session_cookie_secure()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, headers)
}
