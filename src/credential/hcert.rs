use serde_json::{Map, Value};

use super::record::{SignatureValidity, SubjectFields};
use crate::error::HcertError;

/// What the CWT/COSE collaborator extracts from an `HC1:` payload
#[derive(Debug, Clone, PartialEq)]
pub struct HcertDecoded {
    /// CWT claims as JSON (`iss`, `iat`, `exp`, `hcert`, ..)
    pub claims: Map<String, Value>,
    pub subject: SubjectFields,
    pub signature: SignatureValidity,
}

/// Decodes (base45, zlib, COSE_Sign1, CBOR) and verifies an `HC1:` payload
///
/// Signature checking against the trust list lives entirely behind this trait.
#[async_trait::async_trait]
pub trait HcertCodec: Send + Sync {
    async fn decode_hc1(
        &self,
        text: &str,
        verify_signature: bool,
    ) -> Result<HcertDecoded, HcertError>;
}

/// Checks the JWS signature of a compact JWT credential
#[async_trait::async_trait]
pub trait JwsVerifier: Send + Sync {
    async fn verify(&self, compact_jwt: &str) -> anyhow::Result<SignatureValidity>;
}
