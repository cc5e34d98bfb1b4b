//! Persistence port for submissions, feedback, approvals, and one-time
//! codes. Postgres backs production; the in-memory adapter backs
//! development and tests.

use crate::domain::{Feedback, LeaderApproval, Role, Submission, SubmissionStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub notes: String,
    pub photo_urls: Vec<String>,
    pub submitted_by_email: String,
}

/// Whitelisted fields a PATCH may change. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct SubmissionPatch {
    pub status: Option<SubmissionStatus>,
    pub final_post_text: Option<String>,
    pub edited_by_pro: Option<bool>,
}

impl SubmissionPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.final_post_text.is_none() && self.edited_by_pro.is_none()
    }
}

/// Platform ids captured while publishing. Either may be absent; a partial
/// publish still counts as posted.
#[derive(Clone, Debug, Default)]
pub struct PostedIds {
    pub facebook_post_id: Option<String>,
    pub instagram_post_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ListFilter {
    pub status: Option<SubmissionStatus>,
    /// Restrict to one submitter; set for team members, who only see their
    /// own submissions.
    pub submitted_by: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AuthCodeRecord {
    pub code_hash: Vec<u8>,
    pub email: String,
    pub role: Role,
    pub submission_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

/// What a successfully redeemed code grants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeGrant {
    pub email: String,
    pub role: Role,
    pub submission_id: Option<Uuid>,
}

/// A submission plus its feedback history and leader decisions.
#[derive(Clone, Debug)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub feedback: Vec<Feedback>,
    pub approvals: Vec<LeaderApproval>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_submission(
        &self,
        new: NewSubmission,
        draft: Option<String>,
    ) -> Result<Submission>;

    async fn submission(&self, id: Uuid) -> Result<Option<Submission>>;

    async fn submission_detail(&self, id: Uuid) -> Result<Option<SubmissionDetail>>;

    async fn list_submissions(&self, filter: ListFilter) -> Result<Vec<Submission>>;

    /// Apply a patch, bumping `updated_at`. Returns `None` when the
    /// submission does not exist.
    async fn update_submission(
        &self,
        id: Uuid,
        patch: SubmissionPatch,
    ) -> Result<Option<Submission>>;

    /// Transition to `posted`, recording whichever platform ids succeeded.
    async fn mark_posted(&self, id: Uuid, ids: PostedIds) -> Result<Option<Submission>>;

    /// Append one round of feedback with the next version number. The
    /// version assignment is atomic per submission.
    async fn append_feedback(&self, id: Uuid, feedback_text: &str) -> Result<Option<Feedback>>;

    async fn record_leader_approval(
        &self,
        id: Uuid,
        approved: bool,
        comment: Option<&str>,
    ) -> Result<()>;

    async fn insert_auth_code(&self, record: AuthCodeRecord) -> Result<()>;

    /// Redeem a code at most once: the lookup and the used-marker update are
    /// one atomic operation. Unknown, expired, used, and role-mismatched
    /// hashes all return `None`.
    async fn consume_auth_code(
        &self,
        code_hash: &[u8],
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<Option<CodeGrant>>;

    async fn ping(&self) -> Result<()>;
}
