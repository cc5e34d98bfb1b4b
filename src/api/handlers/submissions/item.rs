//! Single-submission read and the whitelisted PATCH.

use super::types::{DetailResponse, SubmissionResponse};
use super::{REVIEWER_ROLES, fetch_submission};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::guard::{self, SubmissionAccess};
use crate::auth::rate_limit::Quota;
use crate::domain::{Role, SubmissionStatus};
use crate::outbound::BotVerdict;
use crate::store::SubmissionPatch;
use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const GET_IP_QUOTA: Quota = Quota::new(30, 900);
const GET_USER_QUOTA: Quota = Quota::new(20, 900);
const PATCH_IP_QUOTA: Quota = Quota::new(20, 900);
const PATCH_USER_QUOTA: Quota = Quota::new(15, 900);

/// Fields a PATCH may never touch, regardless of role.
const SENSITIVE_FIELDS: &[&str] = &[
    "submitted_by_email",
    "photo_urls",
    "id",
    "created_at",
    "updated_at",
];

#[utoipa::path(
    get,
    path = "/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission with history", body = DetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither owner nor reviewer"),
        (status = 404, description = "No such submission")
    ),
    tag = "submissions"
)]
pub async fn get_submission(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    id: Path<Uuid>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/{id}");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, GET_IP_QUOTA).await)?;

    let submission = fetch_submission(&state, *id).await?;
    let session = guard::check_submission_access(
        state.codec(),
        &headers,
        &submission.submitted_by_email,
        SubmissionAccess::OwnerOr(REVIEWER_ROLES),
    )?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, GET_USER_QUOTA)
            .await,
    )?;

    let detail = state
        .store()
        .submission_detail(*id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok((
        StatusCode::OK,
        Json(DetailResponse {
            submission: detail.submission,
            feedback: detail.feedback,
            approvals: detail.approvals,
        }),
    )
        .into_response())
}

#[utoipa::path(
    patch,
    path = "/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 400, description = "Malformed body or unknown status"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Sensitive field, status change without reviewer role, or no access"),
        (status = 404, description = "No such submission")
    ),
    tag = "submissions"
)]
pub async fn patch_submission(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    id: Path<Uuid>,
    payload: Option<Json<serde_json::Value>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/{id}");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, PATCH_IP_QUOTA).await)?;

    let submission = fetch_submission(&state, *id).await?;
    let session = guard::check_submission_access(
        state.codec(),
        &headers,
        &submission.submitted_by_email,
        SubmissionAccess::OwnerOr(REVIEWER_ROLES),
    )?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, PATCH_USER_QUOTA)
            .await,
    )?;

    let Some(Json(body)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };
    let Some(fields) = body.as_object() else {
        return Err(ApiError::Validation("Body must be an object".to_string()));
    };

    // Identity and provenance fields are rejected outright, before looking
    // at anything else in the body.
    if SENSITIVE_FIELDS.iter().any(|field| fields.contains_key(*field)) {
        audit::access_denied(&session.email, *id, &ip);
        return Err(ApiError::AccessDenied);
    }

    // Status changes are reviewer-only. A team member sending `status` is
    // denied even when the rest of the patch would be fine.
    if fields.contains_key("status") && session.role == Role::TeamMember {
        audit::authorization_denied(&session.email, session.role.as_str(), "status");
        return Err(ApiError::RoleDenied);
    }

    let mut patch = SubmissionPatch::default();
    if let Some(raw) = fields.get("status") {
        let raw = raw
            .as_str()
            .ok_or_else(|| ApiError::Validation("status must be a string".to_string()))?;
        patch.status = Some(
            SubmissionStatus::from_str(raw)
                .map_err(|()| ApiError::Validation(format!("Unknown status: {raw}")))?,
        );
    }
    if let Some(raw) = fields.get("final_post_text") {
        let text = raw
            .as_str()
            .ok_or_else(|| ApiError::Validation("final_post_text must be a string".to_string()))?;
        patch.final_post_text = Some(text.to_string());
    }
    if let Some(raw) = fields.get("edited_by_pro") {
        let edited = raw
            .as_bool()
            .ok_or_else(|| ApiError::Validation("edited_by_pro must be a boolean".to_string()))?;
        patch.edited_by_pro = Some(edited);
    }
    if patch.is_empty() {
        return Err(ApiError::Validation("No updatable fields".to_string()));
    }

    let updated = state
        .store()
        .update_submission(*id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    audit::submission_event("submission_patched", *id, &session.email);
    Ok((
        StatusCode::OK,
        Json(SubmissionResponse {
            submission: updated,
        }),
    )
        .into_response())
}
