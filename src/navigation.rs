//! Hand-off of verdicts to the hosting UI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::verify::Verdict;

/// Parameters passed along with the result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub session_id: String,
    /// Caller-type tag given when the scan was started
    pub screen_type: String,
    pub verdict: Verdict,
}

/// One `gotoPage` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    pub page: String,
    pub params: PageParams,
}

/// Receives the terminal verdict of a scan and any progress notes
#[async_trait::async_trait]
pub trait Navigator: Send + Sync {
    async fn goto_page(&self, page: &str, params: PageParams) -> Result<()>;

    /// Progress line shown while collecting multi-part QR codes
    async fn report_progress(&self, _session_id: &str, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Forwards navigations into a channel
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::Sender<Navigation>,
}

impl ChannelNavigator {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Navigation>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl Navigator for ChannelNavigator {
    async fn goto_page(&self, page: &str, params: PageParams) -> Result<()> {
        self.tx
            .send(Navigation {
                page: page.to_string(),
                params,
            })
            .await
            .context("Navigation receiver closed")
    }
}

/// Only logs; used when nothing else listens for verdicts
pub struct LogNavigator;

#[async_trait::async_trait]
impl Navigator for LogNavigator {
    async fn goto_page(&self, page: &str, params: PageParams) -> Result<()> {
        info!(
            "Going to {} ({}): {:?} {}",
            page, params.session_id, params.verdict.status, params.verdict.message
        );
        Ok(())
    }

    async fn report_progress(&self, session_id: &str, message: &str) -> Result<()> {
        info!("[{}] {}", session_id, message);
        Ok(())
    }
}
