//! Magic-link issuance.

use super::types::{SendLinkRequest, SuccessResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{identity, rate_limit::Quota};
use crate::outbound::BotVerdict;
use crate::validation;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const IP_QUOTA: Quota = Quota::new(5, 900);
const EMAIL_QUOTA: Quota = Quota::new(5, 900);

#[utoipa::path(
    post,
    path = "/v1/auth/send-link",
    request_body = SendLinkRequest,
    responses(
        (status = 200, description = "Magic link sent", body = SuccessResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 403, description = "Email not authorized for the role"),
        (status = 429, description = "Too many requests")
    ),
    tag = "auth"
)]
pub async fn send_link(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SendLinkRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/auth/send-link");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };

    // The address is checked exactly as received; no trimming or case
    // folding happens between the wire and the allow-list.
    if !validation::valid_email(&request.email)
        || !state.roles().allowed(&request.email, request.role)
    {
        audit::auth_failure("email_not_authorized", &ip);
        return Err(ApiError::RoleDenied);
    }

    enforce(
        state
            .rate_limiter()
            .limit_identifier(&request.email, EMAIL_QUOTA)
            .await,
    )?;

    let code = identity::create_auth_code(
        state.store(),
        state.config().code_ttl_seconds(),
        &request.email,
        request.role,
        None,
    )
    .await?;

    let link = format!(
        "{}/auth/verify?code={code}&role={}",
        state.config().frontend_base_url().trim_end_matches('/'),
        request.role
    );
    state
        .notifier()
        .magic_link(&request.email, request.role, &link)
        .await?;

    audit::auth_success(&request.email, request.role.as_str(), &ip);
    Ok((StatusCode::OK, Json(SuccessResponse { success: true })).into_response())
}
