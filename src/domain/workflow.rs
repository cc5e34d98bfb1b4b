//! Submission lifecycle transitions.
//!
//! Each action names the status it moves a submission into. Role and
//! ownership gates live with the HTTP handlers; the table here only fixes
//! target states so every mutation path agrees on them.

use super::SubmissionStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Owner hands the draft to the PRO for review.
    MarkReady,
    /// PRO forwards the (possibly edited) post to the leaders.
    SendForApproval,
    /// Leader approves or rejects.
    Decide { approved: bool },
    /// PRO publishes the approved post.
    Publish,
}

impl WorkflowAction {
    #[must_use]
    pub const fn target(self) -> SubmissionStatus {
        match self {
            Self::MarkReady => SubmissionStatus::AwaitingPro,
            Self::SendForApproval => SubmissionStatus::AwaitingLeader,
            Self::Decide { approved: true } => SubmissionStatus::AwaitingProToPost,
            Self::Decide { approved: false } => SubmissionStatus::Rejected,
            Self::Publish => SubmissionStatus::Posted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_follow_the_lifecycle() {
        assert_eq!(
            WorkflowAction::MarkReady.target(),
            SubmissionStatus::AwaitingPro
        );
        assert_eq!(
            WorkflowAction::SendForApproval.target(),
            SubmissionStatus::AwaitingLeader
        );
        assert_eq!(
            WorkflowAction::Decide { approved: true }.target(),
            SubmissionStatus::AwaitingProToPost
        );
        assert_eq!(
            WorkflowAction::Decide { approved: false }.target(),
            SubmissionStatus::Rejected
        );
        assert_eq!(WorkflowAction::Publish.target(), SubmissionStatus::Posted);
    }
}
