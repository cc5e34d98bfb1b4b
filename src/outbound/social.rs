//! Social platform publishing. Facebook takes text with optional photos;
//! Instagram requires a photo.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use ulid::Ulid;

#[async_trait]
pub trait SocialPublisher: Send + Sync {
    /// Returns the created post id.
    async fn post_to_facebook(&self, text: &str, photo_urls: &[String]) -> Result<String>;

    /// Returns the created media id.
    async fn post_to_instagram(&self, text: &str, photo_url: &str) -> Result<String>;
}

/// Development stand-in: logs the post and fabricates ids.
pub struct LogPublisher;

#[async_trait]
impl SocialPublisher for LogPublisher {
    async fn post_to_facebook(&self, text: &str, photo_urls: &[String]) -> Result<String> {
        info!(
            "social[facebook] photos={} text={text:.80}",
            photo_urls.len()
        );
        Ok(format!("fb-dev-{}", Ulid::new()))
    }

    async fn post_to_instagram(&self, text: &str, photo_url: &str) -> Result<String> {
        info!("social[instagram] photo={photo_url} text={text:.80}");
        Ok(format!("ig-dev-{}", Ulid::new()))
    }
}

#[derive(Deserialize)]
struct GraphId {
    id: String,
}

/// Meta Graph API publisher for a Facebook page and an Instagram business
/// account.
pub struct MetaPublisher {
    client: reqwest::Client,
    access_token: SecretString,
    page_id: String,
    instagram_user_id: String,
    base_url: String,
}

impl MetaPublisher {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        access_token: SecretString,
        page_id: String,
        instagram_user_id: String,
    ) -> Self {
        Self {
            client,
            access_token,
            page_id,
            instagram_user_id,
            base_url: "https://graph.facebook.com/v21.0".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn graph_post(&self, path: &str, body: serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .query(&[("access_token", self.access_token.expose_secret())])
            .json(&body)
            .send()
            .await
            .context("failed to reach graph API")?;
        if !response.status().is_success() {
            return Err(anyhow!("graph API returned {}", response.status().as_u16()));
        }
        let created: GraphId = response
            .json()
            .await
            .context("failed to decode graph API response")?;
        Ok(created.id)
    }
}

#[async_trait]
impl SocialPublisher for MetaPublisher {
    async fn post_to_facebook(&self, text: &str, photo_urls: &[String]) -> Result<String> {
        // Photo posts go through the photos edge; text-only through feed.
        if let Some(photo_url) = photo_urls.first() {
            self.graph_post(
                &format!("{}/photos", self.page_id),
                json!({ "url": photo_url, "message": text }),
            )
            .await
        } else {
            self.graph_post(
                &format!("{}/feed", self.page_id),
                json!({ "message": text }),
            )
            .await
        }
    }

    async fn post_to_instagram(&self, text: &str, photo_url: &str) -> Result<String> {
        // Two-step publish: create a media container, then publish it.
        let container = self
            .graph_post(
                &format!("{}/media", self.instagram_user_id),
                json!({ "image_url": photo_url, "caption": text }),
            )
            .await?;
        self.graph_post(
            &format!("{}/media_publish", self.instagram_user_id),
            json!({ "creation_id": container }),
        )
        .await
    }
}
