use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verify::VerdictStatus;

/// Where the scan pipeline currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Starting,
    Scanning,
    Classifying,
    Reassembling,
    Decoding,
    Verifying,
    Done,
    Cancelled,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Done | ScanState::Cancelled)
    }
}

/// Statistics about a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: ScanState,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// When the session reached `Done` or `Cancelled`
    pub finished_at: Option<DateTime<Utc>>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of detector calls so far
    pub ticks: u64,

    /// Detector calls that failed (counted, never fatal)
    pub detector_errors: u64,

    /// Multi-part pieces collected in the current transmission
    pub chunks_received: usize,

    /// Size of the current multi-part transmission, once known
    pub chunks_expected: Option<u32>,

    /// Verdict status once the session is done
    pub verdict: Option<VerdictStatus>,

    /// Verdict message key once the session is done
    pub message: Option<String>,
}

impl SessionStats {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: ScanState::Starting,
            started_at: Utc::now(),
            finished_at: None,
            duration_secs: 0.0,
            ticks: 0,
            detector_errors: 0,
            chunks_received: 0,
            chunks_expected: None,
            verdict: None,
            message: None,
        }
    }
}
