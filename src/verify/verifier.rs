use std::sync::Arc;
use tracing::{error, info, warn};

use super::rules::{BusinessRules, RuleOutcome};
use super::verdict::{messages, Verdict};
use crate::credential::{CredentialDecoder, DecodedCredential, SignatureValidity};
use crate::error::DecodeError;
use crate::fetch::{Fetcher, UrlRewriteRule};
use crate::scan::{classify, PayloadKind};
use crate::store::{SettingsStore, CURRENT_CREDENTIAL_KEY, MY_CERTIFICATE_KEY};

/// Decode, follow indirections, then combine signature and business rules
pub struct Verifier {
    decoder: CredentialDecoder,
    rules: Arc<dyn BusinessRules>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn SettingsStore>,
    rewrite: UrlRewriteRule,
    max_fetch_hops: usize,
}

impl Verifier {
    pub fn new(
        decoder: CredentialDecoder,
        rules: Arc<dyn BusinessRules>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            decoder,
            rules,
            fetcher,
            store,
            rewrite: UrlRewriteRule::default(),
            max_fetch_hops: 3,
        }
    }

    pub fn with_rewrite_rule(mut self, rule: UrlRewriteRule) -> Self {
        self.rewrite = rule;
        self
    }

    pub fn with_max_fetch_hops(mut self, hops: usize) -> Self {
        self.max_fetch_hops = hops;
        self
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Produce the verdict for one complete payload
    pub async fn resolve(&self, kind: PayloadKind, payload: String) -> Verdict {
        match self.decode(kind, payload).await {
            Ok(credential) => self.verify_decoded(credential),
            Err(verdict) => verdict,
        }
    }

    /// Decode one complete payload, following indirection URLs
    ///
    /// A successfully decoded credential replaces the current-credential
    /// slot, whatever the verdict later turns out to be. Failures come back
    /// as the ERROR verdict to report.
    pub async fn decode(
        &self,
        kind: PayloadKind,
        payload: String,
    ) -> Result<DecodedCredential, Verdict> {
        let mut kind = kind;
        let mut payload = payload;
        let mut hops = 0;

        loop {
            match self.decoder.decode(kind, &payload).await {
                Ok(credential) => {
                    info!("Decoded {} credential", credential.kind_tag());
                    self.store_current(&credential).await;
                    return Ok(credential);
                }
                Err(DecodeError::RequiresFetch(url)) => {
                    if hops >= self.max_fetch_hops {
                        error!("Giving up after {} indirections at {}", hops, url);
                        return Err(Verdict::error(messages::FETCH_FAILED));
                    }
                    hops += 1;

                    let target = self.rewrite.rewrite(&url);
                    let body = match self.fetcher.fetch(&target).await {
                        Ok(body) => body.trim().to_string(),
                        Err(e) => {
                            error!("Failed to fetch credential: {}", e);
                            return Err(Verdict::error(messages::FETCH_FAILED));
                        }
                    };

                    kind = classify(&body);
                    if matches!(kind, PayloadKind::Unknown | PayloadKind::MultiPartChunk) {
                        warn!("Fetched content from {} is not a credential ({})", target, kind);
                        return Err(Verdict::error(messages::INVALID_FORMAT));
                    }
                    payload = body;
                }
                Err(DecodeError::InvalidFormat(reason)) => {
                    warn!("Failed to decode {} payload: {}", kind, reason);
                    return Err(Verdict::error(messages::INVALID_FORMAT));
                }
            }
        }
    }

    /// Combine signature validity with the business rules
    ///
    /// An invalid signature is final; a provisional one caps the result at
    /// WARNING; failing rules always give ERROR with the rule's message.
    pub fn verify_decoded(&self, credential: DecodedCredential) -> Verdict {
        let signature = match credential.signature() {
            Some(signature) => signature,
            None => return Verdict::warning(messages::UNSIGNED, credential),
        };

        if signature == SignatureValidity::Invalid {
            return Verdict::error(messages::SIGNATURE_FAILED).with_subject(credential);
        }

        match self.rules.verify(&credential) {
            RuleOutcome::Fail(reason) => {
                info!("Business rules rejected credential: {}", reason);
                Verdict::error(reason).with_subject(credential)
            }
            RuleOutcome::Pass if signature == SignatureValidity::Provisional => {
                Verdict::warning(messages::PROVISIONAL, credential)
            }
            RuleOutcome::Pass => Verdict::ok(messages::VALID, credential),
        }
    }

    /// Verify an HC1 certificate received for the user and keep it unless rejected
    pub async fn accept_own_certificate(&self, text: &str) -> Verdict {
        if classify(text) != PayloadKind::HealthCertificate {
            return Verdict::error(messages::INVALID_FORMAT);
        }

        let credential = match self.decoder.decode(PayloadKind::HealthCertificate, text).await {
            Ok(credential) => credential,
            Err(e) => {
                error!("Error verifying credential: {}", e);
                return Verdict::error(messages::SIGNATURE_FAILED);
            }
        };

        let verdict = self.verify_decoded(credential);
        if verdict.is_error() {
            return verdict;
        }

        if let Err(e) = self
            .store
            .put(MY_CERTIFICATE_KEY, serde_json::Value::String(text.to_string()))
            .await
        {
            error!("Failed to save certificate: {:#}", e);
        } else {
            info!("Saved own certificate");
        }

        verdict
    }

    /// Re-verify the certificate saved by [`accept_own_certificate`](Self::accept_own_certificate)
    pub async fn verify_stored_certificate(&self) -> Verdict {
        let text = match self.store.get(MY_CERTIFICATE_KEY).await {
            Ok(Some(serde_json::Value::String(text))) => text,
            Ok(_) => return Verdict::error(messages::NO_CERTIFICATE),
            Err(e) => {
                error!("Failed to read stored certificate: {:#}", e);
                return Verdict::error(messages::NO_CERTIFICATE);
            }
        };

        match self.decoder.decode(PayloadKind::HealthCertificate, &text).await {
            Ok(credential) => self.verify_decoded(credential),
            Err(e) => {
                error!("Error verifying stored credential: {}", e);
                Verdict::error(messages::INVALID_FORMAT)
            }
        }
    }

    async fn store_current(&self, credential: &DecodedCredential) {
        let value = match serde_json::to_value(credential) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize credential: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.put(CURRENT_CREDENTIAL_KEY, value).await {
            error!("Failed to store current credential: {:#}", e);
        }
    }
}
