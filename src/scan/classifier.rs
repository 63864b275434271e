use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of EU digital COVID certificates
pub const HC1_PREFIX: &str = "HC1:";
/// Prefix of one frame of a multi-part W3C credential
pub const MULTI_PART_PREFIX: &str = "multi|w3cvc|";
/// Prefix of indirection URLs
pub const URL_PREFIX: &str = "https";

/// URL-safe Base64, padding optional
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// What kind of QR encoding a scanned string is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Unknown,
    HealthCertificate,
    MultiPartChunk,
    IndirectionUrl,
    Base64Json,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Unknown => "unknown",
            PayloadKind::HealthCertificate => "health_certificate",
            PayloadKind::MultiPartChunk => "multi_part_chunk",
            PayloadKind::IndirectionUrl => "indirection_url",
            PayloadKind::Base64Json => "base64_json",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a scanned string by prefix, then by shape
///
/// Total: anything unrecognised, garbled or partial maps to `Unknown`.
/// Prefix order matters and is fixed.
pub fn classify(text: &str) -> PayloadKind {
    if text.is_empty() {
        return PayloadKind::Unknown;
    }

    if text.starts_with(HC1_PREFIX) {
        PayloadKind::HealthCertificate
    } else if text.starts_with(MULTI_PART_PREFIX) {
        PayloadKind::MultiPartChunk
    } else if text.starts_with(URL_PREFIX) {
        PayloadKind::IndirectionUrl
    } else if decode_base64_json(text).is_some() {
        PayloadKind::Base64Json
    } else {
        PayloadKind::Unknown
    }
}

/// URL-safe Base64 wrapping a JSON object
pub(crate) fn decode_base64_json(text: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let bytes = URL_SAFE_LENIENT.decode(text.trim()).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}
