use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::camera::CameraConstraints;

/// Configuration for a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Unique session identifier (e.g., "scan-3f2a...")
    pub session_id: String,

    /// Page the verdict is delivered to
    pub result_page: String,

    /// Caller-type tag passed through to the result page
    pub caller_type: String,

    /// Pause between detector calls
    /// Default: 200 ms
    pub detection_interval: Duration,

    /// Stream constraints (device id or facing mode)
    pub constraints: CameraConstraints,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            session_id: format!("scan-{}", uuid::Uuid::new_v4()),
            result_page: "DisplayHcert".to_string(),
            caller_type: String::new(),
            detection_interval: Duration::from_millis(200),
            constraints: CameraConstraints::default(),
        }
    }
}
