//! Verification collaborators reached over HTTP
//!
//! Both services take `{"payload": "<credential text>"}`. The JWT validation
//! service answers 2xx for a verified token and 4xx when the signature, the
//! issuer DID or the key id does not check out. The HC1 service answers with
//! the decoded CWT as [`HcertResponse`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::hcert::{HcertCodec, HcertDecoded, JwsVerifier};
use super::record::{SignatureValidity, SubjectFields};
use crate::error::HcertError;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    payload: &'a str,
}

/// Body returned by the HC1 decoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcertResponse {
    pub claims: Map<String, Value>,
    #[serde(default)]
    pub subject: SubjectFields,
    pub signature: SignatureValidity,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Checks compact JWTs against the issuer's DID document, server side
pub struct RemoteJwsVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteJwsVerifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl JwsVerifier for RemoteJwsVerifier {
    async fn verify(&self, compact_jwt: &str) -> Result<SignatureValidity> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&VerifyRequest {
                payload: compact_jwt,
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        let status = response.status();
        if status.is_success() {
            Ok(SignatureValidity::Valid)
        } else if status.is_client_error() {
            debug!("Credential rejected by {} ({})", self.endpoint, status);
            Ok(SignatureValidity::Invalid)
        } else {
            anyhow::bail!("{} answered with HTTP {}", self.endpoint, status)
        }
    }
}

/// Delegates HC1 decoding and signature checks to a service
pub struct RemoteHcertCodec {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteHcertCodec {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl HcertCodec for RemoteHcertCodec {
    async fn decode_hc1(
        &self,
        text: &str,
        verify_signature: bool,
    ) -> Result<HcertDecoded, HcertError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("verify", verify_signature)])
            .json(&VerifyRequest { payload: text })
            .send()
            .await
            .map_err(|e| HcertError::Malformed(format!("decoder unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HC1 decoder rejected payload ({})", status);
            return Err(HcertError::Malformed(format!("decoder answered HTTP {}", status)));
        }

        let body: HcertResponse = response
            .json()
            .await
            .map_err(|e| HcertError::Malformed(format!("unexpected decoder response: {}", e)))?;

        Ok(HcertDecoded {
            claims: body.claims,
            subject: body.subject,
            signature: body.signature,
        })
    }
}

/// Used when no HC1 decoder is configured; every HC1 payload is rejected
pub struct DisabledHcertCodec;

#[async_trait::async_trait]
impl HcertCodec for DisabledHcertCodec {
    async fn decode_hc1(
        &self,
        _text: &str,
        _verify_signature: bool,
    ) -> Result<HcertDecoded, HcertError> {
        Err(HcertError::Malformed("no HC1 decoder configured".to_string()))
    }
}
