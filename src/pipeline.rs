//! Entry point for starting scan sessions

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::barcode::BarcodeSource;
use crate::camera::{select_camera, MediaSource};
use crate::navigation::Navigator;
use crate::session::{ScanConfig, ScanHandle, ScanSession};
use crate::verify::Verifier;

/// Opens a fresh camera for each session
pub type MediaFactory = Arc<dyn Fn() -> Result<Box<dyn MediaSource>> + Send + Sync>;
/// Creates a fresh detector for each session
pub type DetectorFactory = Arc<dyn Fn() -> Result<Box<dyn BarcodeSource>> + Send + Sync>;

/// Everything a scan session needs, shared between sessions
///
/// Sessions share no mutable state: each gets its own camera, detector and
/// reassembler; only the stateless collaborators are shared.
#[derive(Clone)]
pub struct Pipeline {
    verifier: Arc<Verifier>,
    navigator: Arc<dyn Navigator>,
    media: MediaFactory,
    detector: DetectorFactory,
    detection_interval: Duration,
    default_result_page: String,
    default_caller_type: String,
}

impl Pipeline {
    pub fn new(
        verifier: Arc<Verifier>,
        navigator: Arc<dyn Navigator>,
        media: MediaFactory,
        detector: DetectorFactory,
    ) -> Self {
        Self {
            verifier,
            navigator,
            media,
            detector,
            detection_interval: Duration::from_millis(200),
            default_result_page: "DisplayHcert".to_string(),
            default_caller_type: String::new(),
        }
    }

    pub fn with_detection_interval(mut self, interval: Duration) -> Self {
        self.detection_interval = interval;
        self
    }

    pub fn with_default_result_page(mut self, page: impl Into<String>) -> Self {
        self.default_result_page = page.into();
        self
    }

    pub fn with_default_caller_type(mut self, caller_type: impl Into<String>) -> Self {
        self.default_caller_type = caller_type.into();
        self
    }

    pub fn verifier(&self) -> &Arc<Verifier> {
        &self.verifier
    }

    pub fn default_result_page(&self) -> &str {
        &self.default_result_page
    }

    /// Caller-type tag used when a request does not name one
    pub fn default_caller_type(&self) -> &str {
        &self.default_caller_type
    }

    /// Start a scanning session whose verdict goes to `result_page`
    ///
    /// The camera is opened before this returns; a camera that cannot be
    /// opened yields a `ScanError::StreamAcquisitionFailed`.
    pub async fn start_scan(&self, result_page: &str, caller_type: &str) -> Result<ScanHandle> {
        let constraints = select_camera(self.verifier.store().as_ref()).await;

        let config = ScanConfig {
            result_page: result_page.to_string(),
            caller_type: caller_type.to_string(),
            detection_interval: self.detection_interval,
            constraints,
            ..ScanConfig::default()
        };

        let camera = (self.media)().context("Failed to create camera source")?;
        let detector = (self.detector)().context("Failed to create barcode detector")?;

        info!("Starting scan {} for page {}", config.session_id, result_page);

        let session = ScanSession::new(
            config,
            camera,
            detector,
            Arc::clone(&self.verifier),
            Arc::clone(&self.navigator),
        );

        Ok(session.start().await?)
    }
}
