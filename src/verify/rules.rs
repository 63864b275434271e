use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;

use super::verdict::messages;
use crate::credential::DecodedCredential;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    /// Localizable reason
    Fail(String),
}

/// Post-decode business checks (expiry, issuer trust, document type)
///
/// Independent of signature validity; only consulted for signed credentials.
pub trait BusinessRules: Send + Sync {
    fn verify(&self, credential: &DecodedCredential) -> RuleOutcome;
}

/// Default rules over the standard `exp` / `nbf` / `iss` claims
#[derive(Debug, Clone)]
pub struct StandardRules {
    /// Empty means every issuer is accepted
    pub allowed_issuers: Vec<String>,
    pub clock_skew: Duration,
}

impl Default for StandardRules {
    fn default() -> Self {
        Self {
            allowed_issuers: Vec::new(),
            clock_skew: Duration::seconds(300),
        }
    }
}

impl StandardRules {
    pub fn verify_at(&self, credential: &DecodedCredential, now: DateTime<Utc>) -> RuleOutcome {
        let claims = credential.claims();
        let now = now.timestamp();
        let skew = self.clock_skew.num_seconds();

        if let Some(exp) = claims.get("exp").and_then(epoch_seconds) {
            if now - skew > exp {
                debug!("Credential expired at {} (now {})", exp, now);
                return RuleOutcome::Fail(messages::EXPIRED.to_string());
            }
        }

        if let Some(nbf) = claims.get("nbf").and_then(epoch_seconds) {
            if now + skew < nbf {
                return RuleOutcome::Fail(messages::NOT_YET_VALID.to_string());
            }
        }

        if !self.allowed_issuers.is_empty() {
            let trusted = claims
                .get("iss")
                .and_then(Value::as_str)
                .map(|iss| self.allowed_issuers.iter().any(|allowed| allowed == iss))
                .unwrap_or(false);

            if !trusted {
                return RuleOutcome::Fail(messages::UNTRUSTED_ISSUER.to_string());
            }
        }

        RuleOutcome::Pass
    }
}

impl BusinessRules for StandardRules {
    fn verify(&self, credential: &DecodedCredential) -> RuleOutcome {
        self.verify_at(credential, Utc::now())
    }
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}
