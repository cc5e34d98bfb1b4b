//! In-memory store for development and tests. Single mutex over all state
//! keeps code redemption and version assignment atomic.

use super::{
    AuthCodeRecord, CodeGrant, ListFilter, NewSubmission, PostedIds, Store, SubmissionDetail,
    SubmissionPatch,
};
use crate::domain::{Feedback, LeaderApproval, Role, Submission, SubmissionStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

struct StoredCode {
    record: AuthCodeRecord,
    used: bool,
}

#[derive(Default)]
struct Inner {
    submissions: HashMap<Uuid, Submission>,
    feedback: HashMap<Uuid, Vec<Feedback>>,
    approvals: HashMap<Uuid, Vec<LeaderApproval>>,
    codes: Vec<StoredCode>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
        draft: Option<String>,
    ) -> Result<Submission> {
        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            notes: new.notes,
            photo_urls: new.photo_urls,
            submitted_by_email: new.submitted_by_email,
            status: SubmissionStatus::Draft,
            final_post_text: draft,
            edited_by_pro: false,
            posted_to_facebook: false,
            posted_to_instagram: false,
            facebook_post_id: None,
            instagram_post_id: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.lock().await;
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn submission(&self, id: Uuid) -> Result<Option<Submission>> {
        let inner = self.inner.lock().await;
        Ok(inner.submissions.get(&id).cloned())
    }

    async fn submission_detail(&self, id: Uuid) -> Result<Option<SubmissionDetail>> {
        let inner = self.inner.lock().await;
        Ok(inner.submissions.get(&id).cloned().map(|submission| {
            SubmissionDetail {
                submission,
                feedback: inner.feedback.get(&id).cloned().unwrap_or_default(),
                approvals: inner.approvals.get(&id).cloned().unwrap_or_default(),
            }
        }))
    }

    async fn list_submissions(&self, filter: ListFilter) -> Result<Vec<Submission>> {
        let inner = self.inner.lock().await;
        let mut results: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|submission| {
                filter
                    .status
                    .is_none_or(|status| submission.status == status)
            })
            .filter(|submission| {
                filter
                    .submitted_by
                    .as_deref()
                    .is_none_or(|email| submission.submitted_by_email == email)
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn update_submission(
        &self,
        id: Uuid,
        patch: SubmissionPatch,
    ) -> Result<Option<Submission>> {
        let mut inner = self.inner.lock().await;
        let Some(submission) = inner.submissions.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            submission.status = status;
        }
        if let Some(text) = patch.final_post_text {
            submission.final_post_text = Some(text);
        }
        if let Some(edited) = patch.edited_by_pro {
            submission.edited_by_pro = edited;
        }
        submission.updated_at = Utc::now();
        Ok(Some(submission.clone()))
    }

    async fn mark_posted(&self, id: Uuid, ids: PostedIds) -> Result<Option<Submission>> {
        let mut inner = self.inner.lock().await;
        let Some(submission) = inner.submissions.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();
        submission.status = SubmissionStatus::Posted;
        submission.posted_to_facebook = ids.facebook_post_id.is_some();
        submission.posted_to_instagram = ids.instagram_post_id.is_some();
        submission.facebook_post_id = ids.facebook_post_id;
        submission.instagram_post_id = ids.instagram_post_id;
        submission.posted_at = Some(now);
        submission.updated_at = now;
        Ok(Some(submission.clone()))
    }

    async fn append_feedback(&self, id: Uuid, feedback_text: &str) -> Result<Option<Feedback>> {
        let mut inner = self.inner.lock().await;
        if !inner.submissions.contains_key(&id) {
            return Ok(None);
        }
        let history = inner.feedback.entry(id).or_default();
        let next_version = i32::try_from(history.len()).unwrap_or(i32::MAX - 1) + 1;
        let feedback = Feedback {
            submission_id: id,
            feedback_text: feedback_text.to_string(),
            version_number: next_version,
            created_at: Utc::now(),
        };
        history.push(feedback.clone());
        Ok(Some(feedback))
    }

    async fn record_leader_approval(
        &self,
        id: Uuid,
        approved: bool,
        comment: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.approvals.entry(id).or_default().push(LeaderApproval {
            submission_id: id,
            approved,
            comment: comment.map(str::to_string),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn insert_auth_code(&self, record: AuthCodeRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.codes.push(StoredCode {
            record,
            used: false,
        });
        Ok(())
    }

    async fn consume_auth_code(
        &self,
        code_hash: &[u8],
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<Option<CodeGrant>> {
        // Find-and-mark under one lock so a code redeems at most once.
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.codes.iter_mut().find(|stored| {
            !stored.used
                && stored.record.code_hash == code_hash
                && stored.record.expires_at > now
                && role.is_none_or(|role| stored.record.role == role)
        }) else {
            return Ok(None);
        };
        stored.used = true;
        Ok(Some(CodeGrant {
            email: stored.record.email.clone(),
            role: stored.record.role,
            submission_id: stored.record.submission_id,
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn new_submission(email: &str) -> NewSubmission {
        NewSubmission {
            notes: "planted twelve trees by the creek".to_string(),
            photo_urls: vec!["https://cdn.example.com/p/1.jpg".to_string()],
            submitted_by_email: email.to_string(),
        }
    }

    fn code_record(hash: &[u8], role: Role, ttl: Duration) -> AuthCodeRecord {
        AuthCodeRecord {
            code_hash: hash.to_vec(),
            email: "alice@example.com".to_string(),
            role,
            submission_id: None,
            expires_at: Utc::now() + ttl,
        }
    }

    #[tokio::test]
    async fn create_then_fetch() -> Result<()> {
        let store = MemoryStore::new();
        let created = store
            .create_submission(new_submission("alice@example.com"), Some("draft".into()))
            .await?;
        assert_eq!(created.status, SubmissionStatus::Draft);
        let fetched = store.submission(created.id).await?;
        assert_eq!(fetched.map(|s| s.id), Some(created.id));
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_status() -> Result<()> {
        let store = MemoryStore::new();
        let mine = store
            .create_submission(new_submission("alice@example.com"), None)
            .await?;
        store
            .create_submission(new_submission("bob@example.com"), None)
            .await?;
        store
            .update_submission(
                mine.id,
                SubmissionPatch {
                    status: Some(SubmissionStatus::AwaitingPro),
                    ..SubmissionPatch::default()
                },
            )
            .await?;

        let own = store
            .list_submissions(ListFilter {
                status: None,
                submitted_by: Some("alice@example.com".to_string()),
            })
            .await?;
        assert_eq!(own.len(), 1);

        let awaiting = store
            .list_submissions(ListFilter {
                status: Some(SubmissionStatus::AwaitingPro),
                submitted_by: None,
            })
            .await?;
        assert_eq!(awaiting.len(), 1);
        assert_eq!(awaiting[0].id, mine.id);
        Ok(())
    }

    #[tokio::test]
    async fn feedback_versions_increase() -> Result<()> {
        let store = MemoryStore::new();
        let submission = store
            .create_submission(new_submission("alice@example.com"), None)
            .await?;
        let first = store.append_feedback(submission.id, "shorter").await?;
        let second = store.append_feedback(submission.id, "warmer tone").await?;
        assert_eq!(first.map(|f| f.version_number), Some(1));
        assert_eq!(second.map(|f| f.version_number), Some(2));
        assert!(store.append_feedback(Uuid::new_v4(), "x").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_feedback_appends_get_distinct_versions() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let submission = store
            .create_submission(new_submission("alice@example.com"), None)
            .await?;

        let a = {
            let store = store.clone();
            let id = submission.id;
            tokio::spawn(async move { store.append_feedback(id, "tighter opening").await })
        };
        let b = {
            let store = store.clone();
            let id = submission.id;
            tokio::spawn(async move { store.append_feedback(id, "add the location").await })
        };
        let (a, b) = tokio::try_join!(a, b)?;
        let mut versions = vec![
            a?.ok_or_else(|| anyhow::anyhow!("first append lost"))?
                .version_number,
            b?.ok_or_else(|| anyhow::anyhow!("second append lost"))?
                .version_number,
        ];
        versions.sort_unstable();
        assert_eq!(versions, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn mark_posted_records_partial_ids() -> Result<()> {
        let store = MemoryStore::new();
        let submission = store
            .create_submission(new_submission("alice@example.com"), Some("text".into()))
            .await?;
        let posted = store
            .mark_posted(
                submission.id,
                PostedIds {
                    facebook_post_id: Some("fb_123".to_string()),
                    instagram_post_id: None,
                },
            )
            .await?;
        let posted = posted.ok_or_else(|| anyhow::anyhow!("missing submission"))?;
        assert_eq!(posted.status, SubmissionStatus::Posted);
        assert!(posted.posted_to_facebook);
        assert!(!posted.posted_to_instagram);
        assert!(posted.posted_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn code_redeems_at_most_once() -> Result<()> {
        let store = MemoryStore::new();
        let hash = vec![1u8; 32];
        store
            .insert_auth_code(code_record(&hash, Role::Pro, Duration::hours(4)))
            .await?;

        let first = store.consume_auth_code(&hash, None, Utc::now()).await?;
        assert!(first.is_some());
        let second = store.consume_auth_code(&hash, None, Utc::now()).await?;
        assert!(second.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_redemption_single_winner() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let hash = vec![2u8; 32];
        store
            .insert_auth_code(code_record(&hash, Role::Leader, Duration::hours(4)))
            .await?;

        let a = {
            let store = store.clone();
            let hash = hash.clone();
            tokio::spawn(async move { store.consume_auth_code(&hash, None, Utc::now()).await })
        };
        let b = {
            let store = store.clone();
            let hash = hash.clone();
            tokio::spawn(async move { store.consume_auth_code(&hash, None, Utc::now()).await })
        };
        let (a, b) = tokio::try_join!(a, b)?;
        let winners = usize::from(a?.is_some()) + usize::from(b?.is_some());
        assert_eq!(winners, 1);
        Ok(())
    }

    #[tokio::test]
    async fn expired_and_role_mismatched_codes_fail_uniformly() -> Result<()> {
        let store = MemoryStore::new();
        let expired = vec![3u8; 32];
        store
            .insert_auth_code(code_record(&expired, Role::Pro, Duration::seconds(-1)))
            .await?;
        assert!(store.consume_auth_code(&expired, None, Utc::now()).await?.is_none());

        let wrong_role = vec![4u8; 32];
        store
            .insert_auth_code(code_record(&wrong_role, Role::Pro, Duration::hours(1)))
            .await?;
        assert!(
            store
                .consume_auth_code(&wrong_role, Some(Role::Leader), Utc::now())
                .await?
                .is_none()
        );
        // the failed role-filtered attempt must not have consumed it
        assert!(
            store
                .consume_auth_code(&wrong_role, Some(Role::Pro), Utc::now())
                .await?
                .is_some()
        );

        assert!(
            store
                .consume_auth_code(&[9u8; 32], None, Utc::now())
                .await?
                .is_none()
        );
        Ok(())
    }
}
