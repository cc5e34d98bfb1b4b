//! Postgres adapter. Also backs the rate limiter with one atomic upsert per
//! hit.

use super::{
    AuthCodeRecord, CodeGrant, ListFilter, NewSubmission, PostedIds, Store, SubmissionDetail,
    SubmissionPatch,
};
use crate::auth::rate_limit::{RateLimitStore, WindowSnapshot};
use crate::domain::{Feedback, LeaderApproval, Role, Submission, SubmissionStatus};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use tracing::Instrument;
use uuid::Uuid;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    Role::from_str(raw).map_err(|()| anyhow!("unknown role in database: {raw}"))
}

fn parse_status(raw: &str) -> Result<SubmissionStatus> {
    SubmissionStatus::from_str(raw).map_err(|()| anyhow!("unknown status in database: {raw}"))
}

fn row_to_submission(row: &PgRow) -> Result<Submission> {
    let status: String = row.try_get("status")?;
    Ok(Submission {
        id: row.try_get("id")?,
        notes: row.try_get("notes")?,
        photo_urls: row.try_get("photo_urls")?,
        submitted_by_email: row.try_get("submitted_by_email")?,
        status: parse_status(&status)?,
        final_post_text: row.try_get("final_post_text")?,
        edited_by_pro: row.try_get("edited_by_pro")?,
        posted_to_facebook: row.try_get("posted_to_facebook")?,
        posted_to_instagram: row.try_get("posted_to_instagram")?,
        facebook_post_id: row.try_get("facebook_post_id")?,
        instagram_post_id: row.try_get("instagram_post_id")?,
        posted_at: row.try_get("posted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const SUBMISSION_COLUMNS: &str = "id, notes, photo_urls, submitted_by_email, status, \
     final_post_text, edited_by_pro, posted_to_facebook, posted_to_instagram, \
     facebook_post_id, instagram_post_id, posted_at, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
        draft: Option<String>,
    ) -> Result<Submission> {
        let query = format!(
            "INSERT INTO submissions (notes, photo_urls, submitted_by_email, final_post_text) \
             VALUES ($1, $2, $3, $4) RETURNING {SUBMISSION_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(&new.notes)
            .bind(&new.photo_urls)
            .bind(&new.submitted_by_email)
            .bind(&draft)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert submission")?;
        row_to_submission(&row)
    }

    async fn submission(&self, id: Uuid) -> Result<Option<Submission>> {
        let query = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch submission")?;
        row.as_ref().map(row_to_submission).transpose()
    }

    async fn submission_detail(&self, id: Uuid) -> Result<Option<SubmissionDetail>> {
        let Some(submission) = self.submission(id).await? else {
            return Ok(None);
        };

        let query = "SELECT submission_id, feedback_text, version_number, created_at \
             FROM submission_feedback WHERE submission_id = $1 ORDER BY version_number";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let feedback = sqlx::query(query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch feedback")?
            .iter()
            .map(|row| {
                Ok(Feedback {
                    submission_id: row.try_get("submission_id")?,
                    feedback_text: row.try_get("feedback_text")?,
                    version_number: row.try_get("version_number")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let query = "SELECT submission_id, approved, comment, created_at \
             FROM leader_approvals WHERE submission_id = $1 ORDER BY created_at";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let approvals = sqlx::query(query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch approvals")?
            .iter()
            .map(|row| {
                Ok(LeaderApproval {
                    submission_id: row.try_get("submission_id")?,
                    approved: row.try_get("approved")?,
                    comment: row.try_get("comment")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(SubmissionDetail {
            submission,
            feedback,
            approvals,
        }))
    }

    async fn list_submissions(&self, filter: ListFilter) -> Result<Vec<Submission>> {
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE ($1::text IS NULL OR status = $1) \
             AND ($2::text IS NULL OR submitted_by_email = $2) \
             ORDER BY created_at DESC"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let rows = sqlx::query(&query)
            .bind(filter.status.map(SubmissionStatus::as_str))
            .bind(filter.submitted_by)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list submissions")?;
        rows.iter().map(row_to_submission).collect()
    }

    async fn update_submission(
        &self,
        id: Uuid,
        patch: SubmissionPatch,
    ) -> Result<Option<Submission>> {
        let query = format!(
            "UPDATE submissions SET \
             status = COALESCE($2, status), \
             final_post_text = COALESCE($3, final_post_text), \
             edited_by_pro = COALESCE($4, edited_by_pro), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {SUBMISSION_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(patch.status.map(SubmissionStatus::as_str))
            .bind(patch.final_post_text)
            .bind(patch.edited_by_pro)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update submission")?;
        row.as_ref().map(row_to_submission).transpose()
    }

    async fn mark_posted(&self, id: Uuid, ids: PostedIds) -> Result<Option<Submission>> {
        let query = format!(
            "UPDATE submissions SET \
             status = 'posted', \
             posted_to_facebook = $2 IS NOT NULL, \
             posted_to_instagram = $3 IS NOT NULL, \
             facebook_post_id = $2, \
             instagram_post_id = $3, \
             posted_at = NOW(), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {SUBMISSION_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(ids.facebook_post_id)
            .bind(ids.instagram_post_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark submission posted")?;
        row.as_ref().map(row_to_submission).transpose()
    }

    async fn append_feedback(&self, id: Uuid, feedback_text: &str) -> Result<Option<Feedback>> {
        // Concurrent rounds serialize on a per-submission advisory lock, so
        // the MAX+1 version assignment never collides on the UNIQUE
        // constraint. The lock releases with the transaction.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin feedback transaction")?;

        let lock = "SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = lock
        );
        sqlx::query(lock)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lock feedback history")?;

        let query = "INSERT INTO submission_feedback (submission_id, feedback_text, version_number) \
             SELECT s.id, $2, COALESCE( \
                 (SELECT MAX(f.version_number) FROM submission_feedback f \
                  WHERE f.submission_id = s.id), 0) + 1 \
             FROM submissions s WHERE s.id = $1 \
             RETURNING submission_id, feedback_text, version_number, created_at";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .bind(feedback_text)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to append feedback")?;
        tx.commit()
            .await
            .context("failed to commit feedback transaction")?;
        row.map(|row| {
            Ok(Feedback {
                submission_id: row.try_get("submission_id")?,
                feedback_text: row.try_get("feedback_text")?,
                version_number: row.try_get("version_number")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn record_leader_approval(
        &self,
        id: Uuid,
        approved: bool,
        comment: Option<&str>,
    ) -> Result<()> {
        let query =
            "INSERT INTO leader_approvals (submission_id, approved, comment) VALUES ($1, $2, $3)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(approved)
            .bind(comment)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to record leader approval")?;
        Ok(())
    }

    async fn insert_auth_code(&self, record: AuthCodeRecord) -> Result<()> {
        let query = "INSERT INTO auth_codes (code_hash, email, role, submission_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&record.code_hash)
            .bind(&record.email)
            .bind(record.role.as_str())
            .bind(record.submission_id)
            .bind(record.expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert auth code")?;
        Ok(())
    }

    async fn consume_auth_code(
        &self,
        code_hash: &[u8],
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> Result<Option<CodeGrant>> {
        // Single statement: the used-marker update and the validity checks
        // are one atomic operation, so a code redeems at most once even
        // under concurrent requests.
        let query = "UPDATE auth_codes SET used_at = $3 \
             WHERE code_hash = $1 AND used_at IS NULL AND expires_at > $3 \
             AND ($2::text IS NULL OR role = $2) \
             RETURNING email, role, submission_id";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(code_hash)
            .bind(role.map(Role::as_str))
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume auth code")?;
        row.map(|row| {
            let role: String = row.try_get("role")?;
            Ok(CodeGrant {
                email: row.try_get("email")?,
                role: parse_role(&role)?,
                submission_id: row.try_get("submission_id")?,
            })
        })
        .transpose()
    }

    async fn ping(&self) -> Result<()> {
        let span = tracing::info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire database connection")?;
        conn.ping()
            .instrument(span)
            .await
            .context("failed to ping database")?;
        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for PgStore {
    async fn hit(&self, identifier: &str, window_ms: i64, now_ms: i64) -> Result<WindowSnapshot> {
        let now = Utc
            .timestamp_millis_opt(now_ms)
            .single()
            .ok_or_else(|| anyhow!("invalid rate limit timestamp"))?;
        let reset = Utc
            .timestamp_millis_opt(now_ms + window_ms)
            .single()
            .ok_or_else(|| anyhow!("invalid rate limit window"))?;

        // Fixed window as one upsert: stale windows restart at 1, live
        // windows keep counting past the limit so the caller can compare.
        let query = "INSERT INTO rate_limits (identifier, count, reset_at) VALUES ($1, 1, $2) \
             ON CONFLICT (identifier) DO UPDATE SET \
             count = CASE WHEN rate_limits.reset_at <= $3 THEN 1 ELSE rate_limits.count + 1 END, \
             reset_at = CASE WHEN rate_limits.reset_at <= $3 THEN $2 ELSE rate_limits.reset_at END \
             RETURNING count, reset_at";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(identifier)
            .bind(reset)
            .bind(now)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to update rate limit counter")?;

        let count: i64 = row.try_get("count")?;
        let reset_at: DateTime<Utc> = row.try_get("reset_at")?;
        Ok(WindowSnapshot {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            reset_unix_ms: reset_at.timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_role_rejects_unknown() {
        assert!(parse_role("pro").is_ok());
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn parse_status_rejects_unknown() {
        assert!(parse_status("awaiting_pro_to_post").is_ok());
        assert!(parse_status("archived").is_err());
    }
}
