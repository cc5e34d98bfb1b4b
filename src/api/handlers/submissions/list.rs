//! Submission listing. Team members only ever see their own rows.

use super::types::{ListQuery, ListResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{guard, rate_limit::Quota};
use crate::domain::{Role, SubmissionStatus};
use crate::outbound::BotVerdict;
use crate::store::ListFilter;
use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use std::sync::Arc;

const IP_QUOTA: Quota = Quota::new(30, 900);
const USER_QUOTA: Quota = Quota::new(20, 900);

#[utoipa::path(
    get,
    path = "/v1/submissions",
    params(ListQuery),
    responses(
        (status = 200, description = "Visible submissions", body = ListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Not authenticated"),
        (status = 429, description = "Too many requests")
    ),
    tag = "submissions"
)]
pub async fn list(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    query: Query<ListQuery>,
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

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            SubmissionStatus::from_str(raw)
                .map_err(|()| ApiError::Validation(format!("Unknown status: {raw}")))
        })
        .transpose()?;

    // Visibility is enforced in the filter, not post hoc: a team member's
    // query never leaves their own rows.
    let submitted_by = if session.role == Role::TeamMember {
        Some(session.email)
    } else {
        None
    };

    let submissions = state
        .store()
        .list_submissions(ListFilter {
            status,
            submitted_by,
        })
        .await?;

    Ok((StatusCode::OK, Json(ListResponse { submissions })).into_response())
}
