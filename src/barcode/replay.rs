use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::Path;
use tracing::info;

use super::source::{BarcodeSource, RawScan};
use crate::camera::Frame;
use crate::error::DetectError;

/// Detector that replays a fixed script of payloads, one per call
///
/// Once the script is exhausted every call reports an empty frame.
#[derive(Debug, Default, Clone)]
pub struct ReplayDetector {
    script: VecDeque<String>,
}

impl ReplayDetector {
    pub fn new<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: payloads.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a script file: one payload per line, blank lines and `#` comments skipped
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;

        let detector = Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );

        info!(
            "Loaded replay script {} ({} payloads)",
            path.display(),
            detector.remaining()
        );

        Ok(detector)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait::async_trait]
impl BarcodeSource for ReplayDetector {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<RawScan>, DetectError> {
        Ok(self
            .script
            .pop_front()
            .map(|text| RawScan {
                text,
                timestamp_ms: frame.timestamp_ms,
            })
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        "replay"
    }
}
