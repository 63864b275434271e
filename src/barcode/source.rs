use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::camera::Frame;
use crate::error::DetectError;

/// One payload read from a video frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScan {
    /// Decoded QR text
    pub text: String,
    /// Timestamp of the frame it was read from
    pub timestamp_ms: u64,
}

/// Reads QR payloads out of video frames
///
/// Implementations must return within a single frame's processing time;
/// pacing is the session's job, not the source's.
#[async_trait::async_trait]
pub trait BarcodeSource: Send + Sync {
    /// Zero or more payloads found in `frame`
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<RawScan>, DetectError>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Platform-provided frame-to-barcode detector
#[async_trait::async_trait]
pub trait PlatformDetector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<String>>;
}

/// Software QR decoder working on raw pixels
///
/// Single-result: yields at most one code, or `DetectError::NoCodeFound`.
pub trait PixelDecoder: Send + Sync {
    fn decode(&self, luma: &[u8], width: u32, height: u32) -> Result<String, DetectError>;
}

/// Strategy backed by the platform detector
pub struct NativeDetector {
    inner: Arc<dyn PlatformDetector>,
}

impl NativeDetector {
    pub fn new(inner: Arc<dyn PlatformDetector>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl BarcodeSource for NativeDetector {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<RawScan>, DetectError> {
        let codes = self
            .inner
            .detect(frame)
            .await
            .map_err(|e| DetectError::Detector(format!("{:#}", e)))?;

        Ok(codes
            .into_iter()
            .map(|text| RawScan {
                text,
                timestamp_ms: frame.timestamp_ms,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Strategy backed by the software decoder
///
/// Decoding runs on the blocking pool so a slow frame never stalls the runtime.
pub struct FallbackDetector {
    decoder: Arc<dyn PixelDecoder>,
}

impl FallbackDetector {
    pub fn new(decoder: Arc<dyn PixelDecoder>) -> Self {
        Self { decoder }
    }
}

#[async_trait::async_trait]
impl BarcodeSource for FallbackDetector {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<RawScan>, DetectError> {
        let decoder = Arc::clone(&self.decoder);
        let pixels = frame.clone();

        let text = tokio::task::spawn_blocking(move || {
            decoder.decode(&pixels.luma, pixels.width, pixels.height)
        })
        .await
        .map_err(|e| DetectError::Detector(format!("decoder task failed: {}", e)))??;

        Ok(vec![RawScan {
            text,
            timestamp_ms: frame.timestamp_ms,
        }])
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

/// Barcode source factory
pub struct BarcodeSourceFactory;

impl BarcodeSourceFactory {
    /// Prefer the platform detector when the host offers one
    pub fn create(
        native: Option<Arc<dyn PlatformDetector>>,
        fallback: Arc<dyn PixelDecoder>,
    ) -> Box<dyn BarcodeSource> {
        match native {
            Some(detector) => {
                info!("Barcode detector supported, using native strategy");
                Box::new(NativeDetector::new(detector))
            }
            None => {
                info!("Barcode detector not supported, using software decoder");
                Box::new(FallbackDetector::new(fallback))
            }
        }
    }
}
