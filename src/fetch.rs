//! Indirection URL handling
//!
//! A scanned `https` QR does not hold a credential; it points at one. The
//! rewrite rule maps issuer landing-page links onto the issuer's credential
//! API, then the fetcher downloads the payload for re-classification.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;

/// Deployment-specific mapping from issuer links to credential endpoints
///
/// A URL under `origin` carrying `id=<x>` becomes `credential_endpoint + x`;
/// otherwise `pubid=<x>` becomes `public_credential_endpoint + x`. Anything
/// else is fetched as scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlRewriteRule {
    pub origin: String,
    pub credential_endpoint: String,
    pub public_credential_endpoint: String,
}

impl UrlRewriteRule {
    pub fn rewrite(&self, scanned: &str) -> String {
        let scanned = scanned.trim();

        if self.origin.is_empty() || !scanned.starts_with(&self.origin) {
            return scanned.to_string();
        }

        let Ok(url) = Url::parse(scanned) else {
            return scanned.to_string();
        };

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, value)| key == name && !value.is_empty())
                .map(|(_, value)| value.into_owned())
        };

        if let Some(id) = param("id") {
            format!("{}{}", self.credential_endpoint, id)
        } else if let Some(pubid) = param("pubid") {
            format!("{}{}", self.public_credential_endpoint, pubid)
        } else {
            scanned.to_string()
        }
    }
}

/// Downloads the content an indirection URL points at
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain HTTPS GET
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Rejected {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(FetchError::Rejected {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        info!("Fetching credential from {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: e.into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e.into(),
        })?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
