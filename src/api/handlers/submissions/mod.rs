//! Submission lifecycle endpoints.

pub mod approval;
pub mod create;
pub mod item;
pub mod list;
pub mod publish;
pub mod ready;
pub mod regenerate;
pub mod types;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{Role, Submission};
use uuid::Uuid;

/// Roles that may act on submissions they do not own.
pub(crate) const REVIEWER_ROLES: &[Role] = &[Role::Pro, Role::Leader];

pub(crate) async fn fetch_submission(
    state: &AppState,
    id: Uuid,
) -> Result<Submission, ApiError> {
    state
        .store()
        .submission(id)
        .await?
        .ok_or(ApiError::NotFound)
}
