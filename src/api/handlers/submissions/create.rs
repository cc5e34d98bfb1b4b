//! Submission creation: store the notes and draft the first post text.

use super::types::{CreateRequest, SubmissionResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{guard, rate_limit::Quota};
use crate::outbound::BotVerdict;
use crate::store::NewSubmission;
use crate::validation;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

const IP_QUOTA: Quota = Quota::new(10, 900);
const USER_QUOTA: Quota = Quota::new(10, 900);

#[utoipa::path(
    post,
    path = "/v1/submissions",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Submission created as a draft", body = SubmissionResponse),
        (status = 400, description = "Invalid notes or photos"),
        (status = 401, description = "Not authenticated"),
        (status = 429, description = "Too many requests")
    ),
    tag = "submissions"
)]
pub async fn create(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<CreateRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let session = guard::require_auth(state.codec(), &headers)?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, USER_QUOTA)
            .await,
    )?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };
    validation::validate_notes(&request.notes)
        .map_err(|msg| ApiError::Validation(msg.to_string()))?;
    validation::validate_photo_urls(&request.photo_urls)
        .map_err(|msg| ApiError::Validation(msg.to_string()))?;

    // Drafting is best effort at this point: the submission exists either
    // way and the text can be regenerated later.
    let draft = match state.generator().generate(&request.notes, None, None).await {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("draft generation failed: {err:#}");
            None
        }
    };

    let submission = state
        .store()
        .create_submission(
            NewSubmission {
                notes: request.notes,
                photo_urls: request.photo_urls,
                submitted_by_email: session.email.clone(),
            },
            draft,
        )
        .await?;

    audit::submission_event("submission_created", submission.id, &session.email);
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse { submission }),
    )
        .into_response())
}
