use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of the cryptographic signature check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureValidity {
    Valid,
    Invalid,
    /// Signed by a key from the pre-production trust list
    Provisional,
}

impl From<bool> for SignatureValidity {
    fn from(valid: bool) -> Self {
        if valid {
            SignatureValidity::Valid
        } else {
            SignatureValidity::Invalid
        }
    }
}

/// Holder identity extracted from a health certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectFields {
    pub full_name: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCertificateRecord {
    /// Original `HC1:` text
    pub encoded: String,
    pub decoded: Map<String, Value>,
    pub subject: SubjectFields,
    pub signature: SignatureValidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredentialRecord {
    /// Reassembled compact JWT
    pub encoded: String,
    /// JWT claims segment
    pub decoded: Map<String, Value>,
    pub signature: SignatureValidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationRecord {
    /// Original Base64 text
    pub encoded: String,
    pub decoded: Map<String, Value>,
}

/// Credential produced by a successful decode
///
/// Serialized as `{"type": .., "encoded": .., "decoded": ..}`, the shape kept
/// in the current-credential slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecodedCredential {
    #[serde(rename = "hcert")]
    HealthCertificate(HealthCertificateRecord),
    #[serde(rename = "w3cvc")]
    VerifiableCredential(VerifiableCredentialRecord),
    #[serde(rename = "ukimmigration")]
    Immigration(ImmigrationRecord),
}

impl DecodedCredential {
    pub fn kind_tag(&self) -> &'static str {
        match self {
            DecodedCredential::HealthCertificate(_) => "hcert",
            DecodedCredential::VerifiableCredential(_) => "w3cvc",
            DecodedCredential::Immigration(_) => "ukimmigration",
        }
    }

    pub fn encoded(&self) -> &str {
        match self {
            DecodedCredential::HealthCertificate(r) => &r.encoded,
            DecodedCredential::VerifiableCredential(r) => &r.encoded,
            DecodedCredential::Immigration(r) => &r.encoded,
        }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        match self {
            DecodedCredential::HealthCertificate(r) => &r.decoded,
            DecodedCredential::VerifiableCredential(r) => &r.decoded,
            DecodedCredential::Immigration(r) => &r.decoded,
        }
    }

    /// `None` for credential kinds that carry no signature at all
    pub fn signature(&self) -> Option<SignatureValidity> {
        match self {
            DecodedCredential::HealthCertificate(r) => Some(r.signature),
            DecodedCredential::VerifiableCredential(r) => Some(r.signature),
            DecodedCredential::Immigration(_) => None,
        }
    }
}
