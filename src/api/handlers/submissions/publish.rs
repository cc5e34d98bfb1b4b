//! Publishing to the social platforms. Partial success is success: the
//! submission is marked posted with whichever platform ids came back.

use super::fetch_submission;
use super::types::{PlatformResult, PublishResponse};
use crate::api::error::ApiError;
use crate::api::handlers::{client_ip, enforce};
use crate::api::state::AppState;
use crate::audit;
use crate::auth::{guard, rate_limit::Quota};
use crate::domain::Role;
use crate::outbound::BotVerdict;
use crate::store::PostedIds;
use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const IP_QUOTA: Quota = Quota::new(10, 3600);
const USER_QUOTA: Quota = Quota::new(10, 3600);

#[utoipa::path(
    post,
    path = "/v1/submissions/{id}/post",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission published", body = PublishResponse),
        (status = 400, description = "No final post text"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the pro role"),
        (status = 404, description = "No such submission"),
        (status = 429, description = "Too many requests")
    ),
    tag = "submissions"
)]
pub async fn publish(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    id: Path<Uuid>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers);
    if state.bot_detector().classify(&headers) == BotVerdict::Bot {
        audit::bot_denied(&ip, "/v1/submissions/{id}/post");
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

    let submission = fetch_submission(&state, *id).await?;
    let Some(text) = submission.final_post_text.clone() else {
        return Err(ApiError::Validation(
            "Submission has no post text".to_string(),
        ));
    };

    // Facebook is always attempted; Instagram only with a photo. The two
    // attempts are independent so one platform failing never blocks the
    // other.
    let facebook_id = match state
        .publisher()
        .post_to_facebook(&text, &submission.photo_urls)
        .await
    {
        Ok(post_id) => Some(post_id),
        Err(err) => {
            warn!("facebook publish failed: {err:#}");
            None
        }
    };
    audit::publish_result(*id, "facebook", facebook_id.is_some());

    let instagram = if let Some(photo_url) = submission.photo_urls.first() {
        let instagram_id = match state.publisher().post_to_instagram(&text, photo_url).await {
            Ok(media_id) => Some(media_id),
            Err(err) => {
                warn!("instagram publish failed: {err:#}");
                None
            }
        };
        audit::publish_result(*id, "instagram", instagram_id.is_some());
        PlatformResult::from_outcome(instagram_id)
    } else {
        PlatformResult::skipped()
    };

    let updated = state
        .store()
        .mark_posted(
            *id,
            PostedIds {
                facebook_post_id: facebook_id.clone(),
                instagram_post_id: instagram.post_id.clone(),
            },
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    audit::submission_event("submission_posted", updated.id, &session.email);
    Ok((
        StatusCode::OK,
        Json(PublishResponse {
            submission: updated,
            facebook: PlatformResult::from_outcome(facebook_id),
            instagram,
        }),
    )
        .into_response())
}
