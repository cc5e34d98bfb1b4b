//! Feedback-driven redraft of the post text.

use super::fetch_submission;
use super::types::{RegenerateRequest, RegenerateResponse};
use super::REVIEWER_ROLES;
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::guard::{self, SubmissionAccess};
use crate::auth::rate_limit::Quota;
use crate::outbound::BotVerdict;
use crate::store::SubmissionPatch;
use crate::validation;
use anyhow::Context;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// Tighter than the rest of the surface: every call costs a model invocation.
const IP_QUOTA: Quota = Quota::new(5, 60);
const USER_QUOTA: Quota = Quota::new(5, 60);

#[utoipa::path(
    post,
    path = "/v1/submissions/regenerate",
    request_body = RegenerateRequest,
    responses(
        (status = 200, description = "New draft generated", body = RegenerateResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither owner nor reviewer"),
        (status = 404, description = "No such submission"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Generation failed")
    ),
    tag = "submissions"
)]
pub async fn regenerate(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegenerateRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/regenerate");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };
    if let Some(feedback) = request.feedback.as_deref() {
        validation::validate_feedback(feedback)
            .map_err(|msg| ApiError::Validation(msg.to_string()))?;
    }

    let submission = fetch_submission(&state, request.submission_id).await?;
    let session = guard::check_submission_access(
        state.codec(),
        &headers,
        &submission.submitted_by_email,
        SubmissionAccess::OwnerOr(REVIEWER_ROLES),
    )?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, USER_QUOTA)
            .await,
    )?;

    // A feedback round is only recorded when the caller actually gave one;
    // feedback-less regeneration just redrafts.
    let version = match request.feedback.as_deref() {
        Some(feedback) => Some(
            state
                .store()
                .append_feedback(request.submission_id, feedback)
                .await?
                .ok_or(ApiError::NotFound)?
                .version_number,
        ),
        None => None,
    };

    // Unlike the first draft, the regenerated text IS the response; a
    // generation failure is a real error here.
    let text = state
        .generator()
        .generate(
            &submission.notes,
            submission.final_post_text.as_deref(),
            request.feedback.as_deref(),
        )
        .await
        .context("post regeneration failed")?;

    let updated = state
        .store()
        .update_submission(
            request.submission_id,
            SubmissionPatch {
                final_post_text: Some(text),
                ..SubmissionPatch::default()
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    audit::submission_event("submission_regenerated", updated.id, &session.email);
    Ok((
        StatusCode::OK,
        Json(RegenerateResponse {
            submission: updated,
            version,
        }),
    )
        .into_response())
}
