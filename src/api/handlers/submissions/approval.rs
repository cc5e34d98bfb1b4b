//! PRO forwarding and leader decisions.

use super::fetch_submission;
use super::types::{DecisionRequest, SendForApprovalRequest, SubmissionResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{guard, identity, rate_limit::Quota};
use crate::domain::{Role, workflow::WorkflowAction};
use crate::outbound::BotVerdict;
use crate::store::SubmissionPatch;
use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

const IP_QUOTA: Quota = Quota::new(10, 900);
const USER_QUOTA: Quota = Quota::new(10, 900);

#[utoipa::path(
    post,
    path = "/v1/submissions/{id}/send-for-approval",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = SendForApprovalRequest,
    responses(
        (status = 200, description = "Forwarded to the leaders", body = SubmissionResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the pro role"),
        (status = 404, description = "No such submission"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "No leader configured")
    ),
    tag = "submissions"
)]
pub async fn send_for_approval(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    id: Path<Uuid>,
    payload: Option<Json<SendForApprovalRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/{id}/send-for-approval");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let session = guard::require_role(state.codec(), &headers, Role::Pro)?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, USER_QUOTA)
            .await,
    )?;

    fetch_submission(&state, *id).await?;
    let request = payload.map(|Json(body)| body).unwrap_or_default();

    // Nobody to forward to is a configuration error, caught before the
    // submission is moved so it is not stranded in `awaiting_leader`.
    let Some(primary_leader) = state.roles().primary_leader_email() else {
        return Err(ApiError::Configuration {
            code: "leader_emails_missing",
        });
    };

    let updated = state
        .store()
        .update_submission(
            *id,
            SubmissionPatch {
                status: Some(WorkflowAction::SendForApproval.target()),
                final_post_text: request.final_post_text,
                edited_by_pro: request.edited_by_pro,
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    // One code, addressed to the first configured leader, scoped to this
    // submission; every leader gets the notification.
    let code = identity::create_auth_code(
        state.store(),
        state.config().code_ttl_seconds(),
        primary_leader,
        Role::Leader,
        Some(*id),
    )
    .await?;
    let link = format!(
        "{}/approve/{}?code={code}",
        state.config().frontend_base_url().trim_end_matches('/'),
        updated.id
    );
    state
        .notifier()
        .leader_approval_requested(state.roles().leader_emails(), &updated, &link)
        .await?;

    audit::submission_event("submission_sent_for_approval", updated.id, &session.email);
    Ok((
        StatusCode::OK,
        Json(SubmissionResponse {
            submission: updated,
        }),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/v1/submissions/{id}/approve",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = SubmissionResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the leader role"),
        (status = 404, description = "No such submission"),
        (status = 429, description = "Too many requests")
    ),
    tag = "submissions"
)]
pub async fn decide(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    id: Path<Uuid>,
    payload: Option<Json<DecisionRequest>>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/{id}/approve");
        return Err(ApiError::BotDenied);
    }
    enforce(state.rate_limiter().limit_ip(&ip, IP_QUOTA).await)?;

    let session = guard::require_role(state.codec(), &headers, Role::Leader)?;
    enforce(
        state
            .rate_limiter()
            .limit_identifier(&session.email, USER_QUOTA)
            .await,
    )?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing request body".to_string()));
    };

    fetch_submission(&state, *id).await?;
    state
        .store()
        .record_leader_approval(*id, request.approved, request.comment.as_deref())
        .await?;

    let updated = state
        .store()
        .update_submission(
            *id,
            SubmissionPatch {
                status: Some(
                    WorkflowAction::Decide {
                        approved: request.approved,
                    }
                    .target(),
                ),
                ..SubmissionPatch::default()
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    // The PRO is told either way, with the comment on rejection, and gets a
    // fresh code so the link signs them back in.
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
    let comment = if request.approved {
        None
    } else {
        request.comment.as_deref()
    };
    state
        .notifier()
        .pro_decision(
            state.config().pro_email(),
            &updated,
            request.approved,
            comment,
            &link,
        )
        .await?;

    let event = if request.approved {
        "submission_approved"
    } else {
        "submission_rejected"
    };
    audit::submission_event(event, updated.id, &session.email);
    Ok((
        StatusCode::OK,
        Json(SubmissionResponse {
            submission: updated,
        }),
    )
        .into_response())
}
