use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::store::{SettingsStore, SELECTED_CAMERA_KEY};

/// Which physical camera to prefer when no device id is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera (the one pointed at a QR code)
    Environment,
    /// Front camera
    User,
}

/// Video frame (8-bit luma, row-major)
#[derive(Debug, Clone)]
pub struct Frame {
    /// Grayscale pixels, `width * height` bytes
    pub luma: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl Frame {
    pub fn new(luma: Vec<u8>, width: u32, height: u32, timestamp_ms: u64) -> Self {
        Self {
            luma: luma.into(),
            width,
            height,
            timestamp_ms,
        }
    }

    /// Empty 1x1 frame, for sources whose detector does not look at pixels
    pub fn blank(timestamp_ms: u64) -> Self {
        Self::new(vec![0], 1, 1, timestamp_ms)
    }
}

/// Constraints used to open the video stream (audio is never requested)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    /// Exact device to open, if the user picked one
    pub device_id: Option<String>,
    pub facing_mode: FacingMode,
}

impl CameraConstraints {
    pub fn for_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            facing_mode: FacingMode::Environment,
        }
    }
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            device_id: None,
            facing_mode: FacingMode::Environment,
        }
    }
}

/// Camera/media source
///
/// Implementations:
/// - platform camera bindings (provided by the host application)
/// - [`StillCamera`](super::StillCamera): synthetic frames for headless runs and tests
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Open the video stream
    ///
    /// Returns a receiver that always holds the most recent frame
    /// (`None` until the first frame arrives).
    async fn start(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<watch::Receiver<Option<Frame>>>;

    /// Stop every active video track
    async fn stop(&mut self) -> Result<()>;

    /// Check if any track is still live
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Build stream constraints from the persisted camera preference
///
/// Falls back to the rear-facing camera when nothing usable is stored.
pub async fn select_camera(store: &dyn SettingsStore) -> CameraConstraints {
    match store.get(SELECTED_CAMERA_KEY).await {
        Ok(Some(serde_json::Value::String(id))) if !id.is_empty() => {
            info!("Constraints with device id: {}", id);
            CameraConstraints::for_device(id)
        }
        Ok(_) => {
            info!("Constraints without camera, using rear-facing camera");
            CameraConstraints::default()
        }
        Err(e) => {
            warn!("Failed to read camera preference: {}", e);
            CameraConstraints::default()
        }
    }
}

/// Persist the camera the user picked
pub async fn remember_camera(store: &dyn SettingsStore, device_id: &str) -> Result<()> {
    info!("Selecting camera {}", device_id);
    store
        .put(SELECTED_CAMERA_KEY, serde_json::Value::String(device_id.to_string()))
        .await
}
