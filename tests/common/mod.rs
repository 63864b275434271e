// Shared test doubles for the scan pipeline
#![allow(dead_code)]

use anyhow::{bail, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credscan::barcode::{BarcodeSource, ReplayDetector};
use credscan::camera::{CameraConstraints, Frame, MediaSource, StillCamera};
use credscan::credential::{
    CredentialDecoder, HcertCodec, HcertDecoded, JwsVerifier, SignatureValidity, SubjectFields,
};
use credscan::error::{FetchError, HcertError};
use credscan::fetch::Fetcher;
use credscan::navigation::{ChannelNavigator, Navigation, Navigator};
use credscan::pipeline::{DetectorFactory, MediaFactory, Pipeline};
use credscan::store::{MemoryStore, SettingsStore};
use credscan::verify::{StandardRules, Verifier};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub const HC1_VALID: &str = "HC1:NCFVALID";
pub const HC1_PROVISIONAL: &str = "HC1:NCFPRE";
pub const HC1_BAD_SIGNATURE: &str = "HC1:NCFBADSIG";
pub const HC1_EXPIRED: &str = "HC1:NCFEXPIRED";
pub const HC1_PROVISIONAL_EXPIRED: &str = "HC1:NCFPREEXPIRED";

/// HC1 codec recognising a few fixed payloads; anything else is malformed
pub struct FakeHcertCodec;

#[async_trait::async_trait]
impl HcertCodec for FakeHcertCodec {
    async fn decode_hc1(
        &self,
        text: &str,
        _verify_signature: bool,
    ) -> Result<HcertDecoded, HcertError> {
        let now = chrono::Utc::now().timestamp();
        let (signature, exp) = match text {
            HC1_VALID => (SignatureValidity::Valid, now + 86_400),
            HC1_PROVISIONAL => (SignatureValidity::Provisional, now + 86_400),
            HC1_BAD_SIGNATURE => (SignatureValidity::Invalid, now + 86_400),
            HC1_EXPIRED => (SignatureValidity::Valid, now - 86_400),
            HC1_PROVISIONAL_EXPIRED => (SignatureValidity::Provisional, now - 86_400),
            _ => return Err(HcertError::Malformed("bad base45".to_string())),
        };

        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!("IE"));
        claims.insert("exp".to_string(), json!(exp));
        claims.insert("hcert".to_string(), json!({ "1": { "nam": { "fn": "Doe" } } }));

        Ok(HcertDecoded {
            claims,
            subject: SubjectFields {
                full_name: "Jane Doe".to_string(),
                date_of_birth: "1990-01-01".to_string(),
            },
            signature,
        })
    }
}

/// JWS verifier with a fixed answer
pub struct FixedJwsVerifier(pub SignatureValidity);

#[async_trait::async_trait]
impl JwsVerifier for FixedJwsVerifier {
    async fn verify(&self, _compact_jwt: &str) -> Result<SignatureValidity> {
        Ok(self.0)
    }
}

/// JWS verifier whose backend is down
pub struct BrokenJwsVerifier;

#[async_trait::async_trait]
impl JwsVerifier for BrokenJwsVerifier {
    async fn verify(&self, _compact_jwt: &str) -> Result<SignatureValidity> {
        bail!("connection refused")
    }
}

/// Fetcher serving canned bodies and recording every URL asked for
#[derive(Default)]
pub struct MapFetcher {
    pub bodies: HashMap<String, String>,
    pub requests: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Camera that never opens
pub struct UnavailableCamera;

#[async_trait::async_trait]
impl MediaSource for UnavailableCamera {
    async fn start(
        &mut self,
        _constraints: &CameraConstraints,
    ) -> Result<watch::Receiver<Option<Frame>>> {
        bail!("NotAllowedError: permission denied")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Detector that never returns, for cancelling mid-detection
pub struct HangingDetector {
    pub entered: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl BarcodeSource for HangingDetector {
    async fn detect(
        &mut self,
        _frame: &Frame,
    ) -> Result<Vec<credscan::barcode::RawScan>, credscan::error::DetectError> {
        self.entered.store(true, Ordering::SeqCst);
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

/// Navigator that drops everything; for sessions whose verdict is read via `wait`
pub struct NullNavigator;

#[async_trait::async_trait]
impl Navigator for NullNavigator {
    async fn goto_page(&self, _page: &str, _params: credscan::navigation::PageParams) -> Result<()> {
        Ok(())
    }
}

pub fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64json(value: &Value) -> String {
    b64url(value.to_string().as_bytes())
}

/// Unsigned compact JWT carrying `claims`
pub fn jwt(claims: &Value) -> String {
    format!(
        "{}.{}.{}",
        b64json(&json!({ "alg": "ES256K", "typ": "JWT" })),
        b64json(claims),
        b64url(b"signature")
    )
}

/// Split `payload` into `count` envelopes `multi|w3cvc|TT|II|data`
pub fn chunks(payload: &str, count: usize) -> Vec<String> {
    let len = payload.len();
    (0..count)
        .map(|index| {
            let data = &payload[index * len / count..(index + 1) * len / count];
            format!("multi|w3cvc|{:02}|{:02}|{}", count, index, data)
        })
        .collect()
}

pub fn decoder() -> CredentialDecoder {
    CredentialDecoder::new(Arc::new(FakeHcertCodec))
}

pub fn verifier_with(
    decoder: CredentialDecoder,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn SettingsStore>,
) -> Verifier {
    Verifier::new(decoder, Arc::new(StandardRules::default()), fetcher, store)
}

pub fn verifier(store: Arc<dyn SettingsStore>) -> Verifier {
    verifier_with(decoder(), Arc::new(MapFetcher::default()), store)
}

/// Pipeline with a still camera and a replayed payload script
///
/// Returns the pipeline, the navigation receiver and the shared store.
pub fn replay_pipeline(
    payloads: Vec<String>,
) -> (Pipeline, mpsc::Receiver<Navigation>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let verifier = Arc::new(verifier(store.clone()));
    let (navigator, rx) = ChannelNavigator::new(8);

    let media: MediaFactory = Arc::new(|| {
        Ok(Box::new(StillCamera::new(Duration::from_millis(1))) as Box<dyn MediaSource>)
    });
    let detector: DetectorFactory = Arc::new(move || {
        Ok(Box::new(ReplayDetector::new(payloads.clone())) as Box<dyn BarcodeSource>)
    });

    let pipeline = Pipeline::new(verifier, Arc::new(navigator), media, detector)
        .with_detection_interval(Duration::from_millis(1));

    (pipeline, rx, store)
}
