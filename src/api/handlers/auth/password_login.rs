//! Password login for the single PRO account.

use super::attach_session_cookie;
use super::types::{LoginResponse, PasswordLoginRequest};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{identity, rate_limit::Quota, session::Session};
use crate::domain::Role;
use crate::outbound::BotVerdict;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use std::sync::Arc;

const IP_QUOTA: Quota = Quota::new(5, 900);

#[utoipa::path(
    post,
    path = "/v1/auth/password-login",
    request_body = PasswordLoginRequest,
    responses(
        (status = 200, description = "Logged in as PRO", body = LoginResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Automated request rejected"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Password hash not configured or malformed")
    ),
    tag = "auth"
)]
pub async fn password_login(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<PasswordLoginRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/auth/password-login");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };
    if request.password.is_empty() {
        return Err(ApiError::Validation("Missing password".to_string()));
    }

    // A missing or non-bcrypt hash is a deployment problem, reported as
    // such instead of masquerading as a failed login.
    let Some(hash) = state.config().pro_password_hash() else {
        return Err(ApiError::Configuration {
            code: "pro_password_hash_missing",
        });
    };
    let hash = hash.expose_secret();
    if !identity::bcrypt_hash_format_ok(hash) {
        return Err(ApiError::Configuration {
            code: "pro_password_hash_invalid",
        });
    }

    if !identity::verify_pro_password(&request.password, hash)? {
        audit::auth_failure("wrong_password", &ip);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid credentials" })),
        )
            .into_response());
    }

    let email = state.config().pro_email().to_string();
    let session = Session {
        email: email.clone(),
        role: Role::Pro,
        submission_id: None,
    };
    let body = LoginResponse {
        success: true,
        email: email.clone(),
        role: Role::Pro,
    };
    let response = (StatusCode::OK, Json(body)).into_response();
    let response = attach_session_cookie(&state, &session, response)?;

    audit::auth_success(&email, Role::Pro.as_str(), &ip);
    Ok(response)
}
