use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// Outbound transactional email through the Resend HTTP API. One request per
/// send, no queue, no retry.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    sender: String,
}

impl ResendMailer {
    pub fn new(http: reqwest::Client, api_key: String, sender: String) -> Self {
        Self {
            http,
            api_key,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.sender,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("resend request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("resend returned {status}: {body}");
        }

        info!(%to, %subject, "email sent");
        Ok(())
    }
}

/// Stand-in used when no API key is configured and in tests.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> anyhow::Result<()> {
        warn!(%to, %subject, "email service not configured, skipping send");
        Ok(())
    }
}
