//! Core records shared across the API, store, and outbound adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod workflow;

/// Closed set of caller roles. `pro` and `leader` are parallel roles, not a
/// hierarchy; a role check matches exactly one variant.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TeamMember,
    Pro,
    Leader,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TeamMember => "team_member",
            Self::Pro => "pro",
            Self::Leader => "leader",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "team_member" => Ok(Self::TeamMember),
            "pro" => Ok(Self::Pro),
            "leader" => Ok(Self::Leader),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle states of a submission. `rejected` is terminal.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    AwaitingPro,
    AwaitingLeader,
    AwaitingProToPost,
    Posted,
    Rejected,
}

impl SubmissionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AwaitingPro => "awaiting_pro",
            Self::AwaitingLeader => "awaiting_leader",
            Self::AwaitingProToPost => "awaiting_pro_to_post",
            Self::Posted => "posted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "awaiting_pro" => Ok(Self::AwaitingPro),
            "awaiting_leader" => Ok(Self::AwaitingLeader),
            "awaiting_pro_to_post" => Ok(Self::AwaitingProToPost),
            "posted" => Ok(Self::Posted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Submission {
    pub id: Uuid,
    pub notes: String,
    pub photo_urls: Vec<String>,
    pub submitted_by_email: String,
    pub status: SubmissionStatus,
    pub final_post_text: Option<String>,
    pub edited_by_pro: bool,
    pub posted_to_facebook: bool,
    pub posted_to_instagram: bool,
    pub facebook_post_id: Option<String>,
    pub instagram_post_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One round of regeneration feedback. Versions are assigned by the store
/// and strictly increase per submission.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Feedback {
    pub submission_id: Uuid,
    pub feedback_text: String,
    pub version_number: i32,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a leader decision.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct LeaderApproval {
    pub submission_id: Uuid,
    pub approved: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::TeamMember, Role::Pro, Role::Leader] {
            assert_eq!(Role::from_str(role.as_str()), Ok(role));
        }
        assert_eq!(Role::from_str("admin"), Err(()));
    }

    #[test]
    fn role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::TeamMember).ok();
        assert_eq!(json.as_deref(), Some("\"team_member\""));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SubmissionStatus::Draft,
            SubmissionStatus::AwaitingPro,
            SubmissionStatus::AwaitingLeader,
            SubmissionStatus::AwaitingProToPost,
            SubmissionStatus::Posted,
            SubmissionStatus::Rejected,
        ] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()), Ok(status));
        }
        assert_eq!(SubmissionStatus::from_str("published"), Err(()));
    }
}
