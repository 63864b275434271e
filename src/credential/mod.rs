//! Credential records and the decoder that produces them

pub mod decoder;
pub mod hcert;
pub mod jwt;
pub mod record;
pub mod remote;

pub use decoder::CredentialDecoder;
pub use hcert::{HcertCodec, HcertDecoded, JwsVerifier};
pub use remote::{DisabledHcertCodec, RemoteHcertCodec, RemoteJwsVerifier};
pub use record::{
    DecodedCredential, HealthCertificateRecord, ImmigrationRecord, SignatureValidity,
    SubjectFields, VerifiableCredentialRecord,
};
