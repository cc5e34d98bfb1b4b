//! Owner hands a draft to the PRO for review.

use super::fetch_submission;
use super::types::{ReadyRequest, SubmissionResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::guard::{self, SubmissionAccess};
use crate::auth::{identity, rate_limit::Quota};
use crate::domain::{Role, workflow::WorkflowAction};
use crate::outbound::BotVerdict;
use crate::store::SubmissionPatch;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const IP_QUOTA: Quota = Quota::new(10, 900);
const USER_QUOTA: Quota = Quota::new(10, 900);

#[utoipa::path(
    post,
    path = "/v1/submissions/ready",
    request_body = ReadyRequest,
    responses(
        (status = 200, description = "Submission queued for PRO review", body = SubmissionResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Only the owner may mark a submission ready"),
        (status = 404, description = "No such submission"),
        (status = 429, description = "Too many requests")
    ),
    tag = "submissions"
)]
pub async fn ready(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ReadyRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/ready");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };

    let submission = fetch_submission(&state, request.submission_id).await?;
    let session = guard::check_submission_access(
        state.codec(),
        &headers,
        &submission.submitted_by_email,
        SubmissionAccess::OwnerOnly,
    )?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, USER_QUOTA)
            .await,
    )?;

    let updated = state
        .store()
        .update_submission(
            request.submission_id,
            SubmissionPatch {
                status: Some(WorkflowAction::MarkReady.target()),
                ..SubmissionPatch::default()
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    // The PRO gets a one-time code so the review link signs them in.
    let code = identity::create_auth_code(
        state.store(),
        state.config().code_ttl_seconds(),
        state.config().pro_email(),
        Role::Pro,
        None,
    )
    .await?;
    let link = format!(
        "{}/review/{}?code={code}",
        state.config().frontend_base_url().trim_end_matches('/'),
        updated.id
    );
    state
        .notifier()
        .pro_review_requested(state.config().pro_email(), &updated, &link)
        .await?;

    audit::submission_event("submission_ready", updated.id, &session.email);
    Ok((
        StatusCode::OK,
        Json(SubmissionResponse {
            submission: updated,
        }),
    )
        .into_response())
}
