use thiserror::Error;

/// Failure of a single detector call.
///
/// Neither variant is terminal: the scan loop logs it and treats the tick
/// as "no code this tick".
#[derive(Debug, Error)]
pub enum DetectError {
    /// The fallback decoder found no QR code in the frame
    #[error("no code found in frame")]
    NoCodeFound,

    /// The platform detector failed internally
    #[error("detector failure: {0}")]
    Detector(String),
}

/// Failure to turn a classified payload into a credential record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed base45/zlib/CBOR, bad JWT segment, bad Base64 or JSON
    #[error("invalid credential format: {0}")]
    InvalidFormat(String),

    /// Payload is a pointer to a remote resource and must be fetched first
    #[error("credential must be fetched from {0}")]
    RequiresFetch(String),
}

/// Failure reported by the HC1 (CWT/COSE) decoding collaborator
#[derive(Debug, Error)]
pub enum HcertError {
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    #[error("malformed HC1 payload: {0}")]
    Malformed(String),
}

/// Failure of the indirection fetch step
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid fetch URL {url}: {reason}")]
    Rejected { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Terminal failures of a scan session that never produce a verdict
#[derive(Debug, Error)]
pub enum ScanError {
    /// Camera stream could not be opened; surfaced before any scanning
    #[error("failed to acquire camera stream: {0}")]
    StreamAcquisitionFailed(String),

    /// The session task was already joined
    #[error("scan session already finished")]
    AlreadyFinished,

    #[error("scan task failed: {0}")]
    Task(String),
}
