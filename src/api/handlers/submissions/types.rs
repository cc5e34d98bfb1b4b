//! Request and response bodies for the submissions surface.

use crate::domain::{Feedback, LeaderApproval, Submission};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateRequest {
    pub notes: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(IntoParams, Deserialize, Debug)]
pub struct ListQuery {
    /// Filter by lifecycle status.
    pub status: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ListResponse {
    pub submissions: Vec<Submission>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct DetailResponse {
    pub submission: Submission,
    pub feedback: Vec<Feedback>,
    pub approvals: Vec<LeaderApproval>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ReadyRequest {
    pub submission_id: Uuid,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegenerateRequest {
    pub submission_id: Uuid,
    /// Optional steering for the next draft. When absent the text is simply
    /// redrafted and no feedback round is recorded.
    pub feedback: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegenerateResponse {
    pub submission: Submission,
    /// Version number of the recorded feedback round, when one was given.
    pub version: Option<i32>,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct SendForApprovalRequest {
    pub final_post_text: Option<String>,
    pub edited_by_pro: Option<bool>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct DecisionRequest {
    pub approved: bool,
    pub comment: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PlatformResult {
    pub attempted: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

impl PlatformResult {
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            attempted: false,
            success: false,
            post_id: None,
        }
    }

    #[must_use]
    pub fn from_outcome(outcome: Option<String>) -> Self {
        Self {
            attempted: true,
            success: outcome.is_some(),
            post_id: outcome,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PublishResponse {
    pub submission: Submission,
    pub facebook: PlatformResult,
    pub instagram: PlatformResult,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SubmissionResponse {
    pub submission: Submission,
}
