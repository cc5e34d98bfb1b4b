//! AI draft generation for post text.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

#[async_trait]
pub trait PostGenerator: Send + Sync {
    /// Draft (or redraft) a post from the raw field notes. `previous` and
    /// `feedback` are set on regeneration.
    async fn generate(
        &self,
        notes: &str,
        previous: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String>;
}

/// Development stand-in: deterministic template so the workflow is testable
/// without a model behind it.
pub struct TemplateGenerator;

#[async_trait]
impl PostGenerator for TemplateGenerator {
    async fn generate(
        &self,
        notes: &str,
        _previous: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String> {
        let base = notes.trim();
        match feedback {
            Some(feedback) => Ok(format!("{base} (revised: {})", feedback.trim())),
            None => Ok(format!("From the field: {base}")),
        }
    }
}

/// Gemini-backed generator.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            client,
            api_key,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn prompt(notes: &str, previous: Option<&str>, feedback: Option<&str>) -> String {
        let mut prompt = format!(
            "Write a short, warm social media post from these volunteer field notes. \
             Plain text only, no hashtags beyond two.\n\nNotes:\n{notes}\n"
        );
        if let Some(previous) = previous {
            prompt.push_str(&format!("\nPrevious draft:\n{previous}\n"));
        }
        if let Some(feedback) = feedback {
            prompt.push_str(&format!("\nRevise according to this feedback:\n{feedback}\n"));
        }
        prompt
    }
}

#[async_trait]
impl PostGenerator for GeminiGenerator {
    async fn generate(
        &self,
        notes: &str,
        previous: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": Self::prompt(notes, previous, feedback) }]
                }]
            }))
            .send()
            .await
            .context("failed to reach generation API")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "generation API returned {}",
                response.status().as_u16()
            ));
        }
        let body: Value = response
            .json()
            .await
            .context("failed to decode generation response")?;
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| anyhow!("generation response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_generator_first_draft() -> Result<()> {
        let text = TemplateGenerator
            .generate("we planted twelve trees", None, None)
            .await?;
        assert!(text.contains("we planted twelve trees"));
        Ok(())
    }

    #[tokio::test]
    async fn template_generator_applies_feedback() -> Result<()> {
        let text = TemplateGenerator
            .generate("notes", Some("old draft"), Some("make it shorter"))
            .await?;
        assert!(text.contains("make it shorter"));
        Ok(())
    }

    #[test]
    fn prompt_includes_all_sections() {
        let prompt = GeminiGenerator::prompt("notes here", Some("draft"), Some("shorter"));
        assert!(prompt.contains("notes here"));
        assert!(prompt.contains("draft"));
        assert!(prompt.contains("shorter"));
    }
}
