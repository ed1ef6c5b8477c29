//! Notification port, called by the Notifier stage once the document exists.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected notice (status {0})")]
    Rejected(u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeListing {
    pub rank: usize,
    pub title: String,
    pub company: String,
    pub url: String,
}

/// What a finished run tells the outside world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunNotice {
    pub run_id: Uuid,
    pub document_filename: String,
    pub document_size_bytes: usize,
    pub top_listings: Vec<NoticeListing>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &RunNotice) -> Result<(), NotifyError>;
}

/// Writes the notice to the log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &RunNotice) -> Result<(), NotifyError> {
        info!(
            run_id = %notice.run_id,
            document = %notice.document_filename,
            size_bytes = notice.document_size_bytes,
            listings = notice.top_listings.len(),
            "cover letters ready"
        );
        Ok(())
    }
}

/// POSTs the notice as JSON to a configured URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notice: &RunNotice) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(notice).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        info!(run_id = %notice.run_id, "webhook notified");
        Ok(())
    }
}
