use serde::{Deserialize, Serialize};

use crate::credential::DecodedCredential;

/// Localizable message keys carried by verdicts
pub mod messages {
    pub const VALID: &str = "The certificate is valid.";
    pub const SIGNATURE_FAILED: &str = "Signature validation failed. The certificate is not valid.";
    /// Signed with a pre-production key; the UI substitutes its warning text
    pub const PROVISIONAL: &str = "$warningmsg";
    pub const INVALID_FORMAT: &str = "The credential has an invalid format.";
    pub const FETCH_FAILED: &str = "The credential could not be retrieved.";
    pub const UNSIGNED: &str = "The credential is not signed.";
    pub const NO_CERTIFICATE: &str = "There is no certificate.";
    pub const EXPIRED: &str = "The certificate has expired.";
    pub const NOT_YET_VALID: &str = "The certificate is not valid yet.";
    pub const UNTRUSTED_ISSUER: &str = "The issuer of the certificate is not trusted.";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Ok,
    Warning,
    Error,
}

/// Terminal outcome of one scan session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    /// Localizable message key
    pub message: String,
    /// Decoded credential, when decoding got that far
    pub subject: Option<DecodedCredential>,
}

impl Verdict {
    pub fn ok(message: impl Into<String>, subject: DecodedCredential) -> Self {
        Self {
            status: VerdictStatus::Ok,
            message: message.into(),
            subject: Some(subject),
        }
    }

    pub fn warning(message: impl Into<String>, subject: DecodedCredential) -> Self {
        Self {
            status: VerdictStatus::Warning,
            message: message.into(),
            subject: Some(subject),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Error,
            message: message.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: DecodedCredential) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == VerdictStatus::Error
    }
}
