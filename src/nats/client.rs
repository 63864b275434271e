use anyhow::{Context, Result};
use async_nats::Client;
use tracing::info;

use super::messages::{ProgressMessage, VerdictMessage};
use crate::navigation::{Navigator, PageParams};

pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn verdict_subject(session_id: &str) -> String {
        format!("scan.verdict.{}", session_id)
    }

    pub fn progress_subject(session_id: &str) -> String {
        format!("scan.progress.{}", session_id)
    }

    /// Publish the terminal verdict of a session
    pub async fn publish_verdict(&self, page: &str, params: &PageParams) -> Result<()> {
        let subject = Self::verdict_subject(&params.session_id);

        let message = VerdictMessage {
            session_id: params.session_id.clone(),
            page: page.to_string(),
            screen_type: params.screen_type.clone(),
            status: params.verdict.status,
            message: params.verdict.message.clone(),
            credential_type: params
                .verdict
                .subject
                .as_ref()
                .map(|credential| credential.kind_tag().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish verdict")?;

        info!("Published verdict to {} ({:?})", subject, message.status);

        Ok(())
    }

    /// Publish a progress line
    pub async fn publish_progress(&self, session_id: &str, text: &str) -> Result<()> {
        let subject = Self::progress_subject(session_id);

        let message = ProgressMessage {
            session_id: session_id.to_string(),
            message: text.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish progress")?;

        Ok(())
    }

    /// Subscribe to verdicts of every session
    pub async fn subscribe_verdicts(&self) -> Result<async_nats::Subscriber> {
        let subject = "scan.verdict.>";

        info!("Subscribing to verdicts on {}", subject);

        self.client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to verdicts")
    }
}

/// Navigator that publishes verdicts and progress over NATS
pub struct NatsNavigator {
    client: NatsClient,
}

impl NatsNavigator {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Navigator for NatsNavigator {
    async fn goto_page(&self, page: &str, params: PageParams) -> Result<()> {
        self.client.publish_verdict(page, &params).await
    }

    async fn report_progress(&self, session_id: &str, message: &str) -> Result<()> {
        self.client.publish_progress(session_id, message).await
    }
}
