//! Email notifications for the approval chain.

use crate::domain::{Role, Submission};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Magic-link email carrying a one-time login code.
    async fn magic_link(&self, email: &str, role: Role, link: &str) -> Result<()>;

    /// A submission is ready for PRO review.
    async fn pro_review_requested(
        &self,
        pro_email: &str,
        submission: &Submission,
        link: &str,
    ) -> Result<()>;

    /// The PRO forwarded a post; leaders get the approval link.
    async fn leader_approval_requested(
        &self,
        leader_emails: &[String],
        submission: &Submission,
        link: &str,
    ) -> Result<()>;

    /// A leader decided; tell the PRO, with the comment on rejection.
    async fn pro_decision(
        &self,
        pro_email: &str,
        submission: &Submission,
        approved: bool,
        comment: Option<&str>,
        link: &str,
    ) -> Result<()>;
}

/// Development stand-in: logs instead of sending so flows are observable
/// without a mail provider.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn magic_link(&self, email: &str, role: Role, link: &str) -> Result<()> {
        info!("email[magic_link] to={email} role={role} link={link}");
        Ok(())
    }

    async fn pro_review_requested(
        &self,
        pro_email: &str,
        submission: &Submission,
        link: &str,
    ) -> Result<()> {
        info!(
            "email[pro_review] to={pro_email} submission={} link={link}",
            submission.id
        );
        Ok(())
    }

    async fn leader_approval_requested(
        &self,
        leader_emails: &[String],
        submission: &Submission,
        link: &str,
    ) -> Result<()> {
        info!(
            "email[leader_approval] to={} submission={} link={link}",
            leader_emails.join(","),
            submission.id
        );
        Ok(())
    }

    async fn pro_decision(
        &self,
        pro_email: &str,
        submission: &Submission,
        approved: bool,
        comment: Option<&str>,
        link: &str,
    ) -> Result<()> {
        info!(
            "email[pro_decision] to={pro_email} submission={} approved={approved} comment={} link={link}",
            submission.id,
            comment.unwrap_or("-")
        );
        Ok(())
    }
}

/// Resend-backed mailer.
pub struct ResendNotifier {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
    base_url: String,
}

impl ResendNotifier {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: SecretString, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
            base_url: "https://api.resend.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn send(&self, to: &[String], subject: &str, html: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("failed to reach email provider")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "email provider returned {}",
                response.status().as_u16()
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn magic_link(&self, email: &str, role: Role, link: &str) -> Result<()> {
        let html = format!(
            "<p>Use this link to sign in as {role}:</p><p><a href=\"{link}\">{link}</a></p>\
             <p>The link can be used once and expires in a few hours.</p>"
        );
        self.send(&[email.to_string()], "Your sign-in link", &html)
            .await
    }

    async fn pro_review_requested(
        &self,
        pro_email: &str,
        submission: &Submission,
        link: &str,
    ) -> Result<()> {
        let html = format!(
            "<p>A submission from {} is ready for review.</p>\
             <p><a href=\"{link}\">Review it</a></p>",
            submission.submitted_by_email
        );
        self.send(
            &[pro_email.to_string()],
            "Submission ready for review",
            &html,
        )
        .await
    }

    async fn leader_approval_requested(
        &self,
        leader_emails: &[String],
        submission: &Submission,
        link: &str,
    ) -> Result<()> {
        let html = format!(
            "<p>A post based on notes from {} needs approval.</p>\
             <p><a href=\"{link}\">Approve or reject</a></p>",
            submission.submitted_by_email
        );
        self.send(leader_emails, "Post awaiting approval", &html)
            .await
    }

    async fn pro_decision(
        &self,
        pro_email: &str,
        submission: &Submission,
        approved: bool,
        comment: Option<&str>,
        link: &str,
    ) -> Result<()> {
        let (subject, verdict) = if approved {
            ("Post approved", "approved and ready to publish")
        } else {
            ("Post rejected", "rejected")
        };
        let mut html = format!(
            "<p>The post from {} was {verdict}.</p>",
            submission.submitted_by_email
        );
        if let Some(comment) = comment {
            html.push_str(&format!("<p>Comment: {comment}</p>"));
        }
        html.push_str(&format!("<p><a href=\"{link}\">Open it</a></p>"));
        self.send(&[pro_email.to_string()], subject, &html).await
    }
}
