//! Shared-secret login for the review dashboard.

use super::attach_session_cookie;
use super::types::{DashboardAuthRequest, DashboardAuthResponse};
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

/// Fixed principal for dashboard sessions: passes `pro` role gates but can
/// never match an ownership check.
const DASHBOARD_PRINCIPAL: &str = "dashboard@internal";

#[utoipa::path(
    post,
    path = "/v1/dashboard/auth",
    request_body = DashboardAuthRequest,
    responses(
        (status = 200, description = "Dashboard unlocked", body = DashboardAuthResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Wrong password"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Dashboard password not configured")
    ),
    tag = "auth"
)]
pub async fn dashboard_auth(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<DashboardAuthRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/dashboard/auth");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };

    let Some(expected) = state.config().dashboard_password() else {
        return Err(ApiError::Configuration {
            code: "dashboard_password_missing",
        });
    };

    if !identity::secret_matches(&request.password, expected.expose_secret()) {
        audit::auth_failure("wrong_dashboard_password", &ip);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(DashboardAuthResponse {
                authenticated: false,
            }),
        )
            .into_response());
    }

    let session = Session {
        email: DASHBOARD_PRINCIPAL.to_string(),
        role: Role::Pro,
        submission_id: None,
    };
    let response = (
        StatusCode::OK,
        Json(DashboardAuthResponse {
            authenticated: true,
        }),
    )
        .into_response();
    let response = attach_session_cookie(&state, &session, response)?;

    audit::auth_success(DASHBOARD_PRINCIPAL, Role::Pro.as_str(), &ip);
    Ok(response)
}
