//! One-time code redemption. All failure modes look identical to the
//! caller.

use super::attach_session_cookie;
use super::types::{ValidateRequest, ValidateResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{identity, rate_limit::Quota, session::Session};
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const IP_QUOTA: Quota = Quota::new(10, 900);

#[utoipa::path(
    post,
    path = "/v1/auth/validate",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Code redeemed, session established", body = ValidateResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Invalid code", body = ValidateResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "auth"
)]
pub async fn validate(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ValidateRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };
    if request.code.trim().is_empty() {
        return Err(ApiError::Validation("Missing code".to_string()));
    }

    let grant = identity::validate_auth_code(state.store(), &request.code, request.role).await?;
    let Some(grant) = grant else {
        // Unknown, expired, used, and role-mismatched codes are
        // indistinguishable here on purpose.
        audit::auth_failure("invalid_code", &ip);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(ValidateResponse::invalid()),
        )
            .into_response());
    };

    let session = Session {
        email: grant.email.clone(),
        role: grant.role,
        submission_id: grant.submission_id,
    };
    let body = ValidateResponse {
        valid: true,
        email: Some(grant.email.clone()),
        role: Some(grant.role),
        submission_id: grant.submission_id,
    };
    let response = (StatusCode::OK, Json(body)).into_response();
    let response = attach_session_cookie(&state, &session, response)?;

    audit::auth_success(&grant.email, grant.role.as_str(), &ip);
    Ok(response)
}
