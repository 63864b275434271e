use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::hcert::{HcertCodec, JwsVerifier};
use super::jwt;
use super::record::{
    DecodedCredential, HealthCertificateRecord, ImmigrationRecord, SignatureValidity,
    VerifiableCredentialRecord,
};
use crate::error::DecodeError;
use crate::scan::classifier::URL_SAFE_LENIENT;
use crate::scan::PayloadKind;

/// Turns a complete payload into a credential record
///
/// Exactly one attempt per payload; a failure is never retried and never
/// yields a partially populated record.
#[derive(Clone)]
pub struct CredentialDecoder {
    hcert: Arc<dyn HcertCodec>,
    jws: Option<Arc<dyn JwsVerifier>>,
}

impl CredentialDecoder {
    pub fn new(hcert: Arc<dyn HcertCodec>) -> Self {
        Self { hcert, jws: None }
    }

    /// Check JWT credential signatures instead of reporting them provisional
    pub fn with_jws_verifier(mut self, verifier: Arc<dyn JwsVerifier>) -> Self {
        self.jws = Some(verifier);
        self
    }

    pub async fn decode(
        &self,
        kind: PayloadKind,
        payload: &str,
    ) -> Result<DecodedCredential, DecodeError> {
        debug!("Decoding {} payload ({} bytes)", kind, payload.len());

        match kind {
            PayloadKind::HealthCertificate => self.decode_hcert(payload).await,
            PayloadKind::MultiPartChunk => self.decode_jwt(payload).await,
            PayloadKind::IndirectionUrl => Err(DecodeError::RequiresFetch(payload.trim().to_string())),
            PayloadKind::Base64Json => decode_immigration(payload),
            PayloadKind::Unknown => Err(DecodeError::InvalidFormat(
                "unrecognised payload".to_string(),
            )),
        }
    }

    async fn decode_hcert(&self, payload: &str) -> Result<DecodedCredential, DecodeError> {
        let decoded = self
            .hcert
            .decode_hc1(payload, true)
            .await
            .map_err(|e| DecodeError::InvalidFormat(e.to_string()))?;

        Ok(DecodedCredential::HealthCertificate(HealthCertificateRecord {
            encoded: payload.to_string(),
            decoded: decoded.claims,
            subject: decoded.subject,
            signature: decoded.signature,
        }))
    }

    async fn decode_jwt(&self, payload: &str) -> Result<DecodedCredential, DecodeError> {
        let claims = jwt::decode_claims(payload)?;

        let signature = match &self.jws {
            Some(verifier) => verifier.verify(payload).await.unwrap_or_else(|e| {
                warn!("JWS verification failed: {:#}", e);
                SignatureValidity::Invalid
            }),
            None => SignatureValidity::Provisional,
        };

        Ok(DecodedCredential::VerifiableCredential(VerifiableCredentialRecord {
            encoded: payload.to_string(),
            decoded: claims,
            signature,
        }))
    }
}

fn decode_immigration(payload: &str) -> Result<DecodedCredential, DecodeError> {
    let bytes = URL_SAFE_LENIENT
        .decode(payload.trim())
        .map_err(|e| DecodeError::InvalidFormat(format!("not URL-safe Base64: {}", e)))?;

    let decoded = match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(DecodeError::InvalidFormat(
                "Base64 payload is not a JSON object".to_string(),
            ))
        }
        Err(e) => return Err(DecodeError::InvalidFormat(format!("not JSON: {}", e))),
    };

    Ok(DecodedCredential::Immigration(ImmigrationRecord {
        encoded: payload.to_string(),
        decoded,
    }))
}
