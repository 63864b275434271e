use super::cancel::{CancelHandle, CancelSignal};
use super::config::ScanConfig;
use super::stats::{ScanState, SessionStats};
use crate::barcode::{BarcodeSource, RawScan};
use crate::camera::{Frame, MediaSource};
use crate::error::{DetectError, ScanError};
use crate::navigation::{Navigator, PageParams};
use crate::scan::{classify, ChunkEnvelope, ChunkOutcome, ChunkReassembler, PayloadKind};
use crate::verify::{Verdict, Verifier};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

enum LoopExit {
    Verdict(Verdict),
    Cancelled,
}

/// One scanning session: camera -> detector -> classifier -> reassembler ->
/// decoder -> verifier -> navigator
///
/// Strictly sequential: a detector call is awaited before the next tick is
/// scheduled, and once a payload is complete its decode/verify step runs to
/// completion without racing further scans.
pub struct ScanSession {
    /// Session configuration
    config: ScanConfig,

    /// Camera stream
    camera: Box<dyn MediaSource>,

    /// Frame-to-payload detector
    detector: Box<dyn BarcodeSource>,

    /// Decode and verification step
    verifier: Arc<Verifier>,

    /// Receives the verdict and progress notes
    navigator: Arc<dyn Navigator>,

    /// Multi-part state, owned by this session only
    reassembler: ChunkReassembler,

    /// Shared statistics
    stats: Arc<Mutex<SessionStats>>,
}

impl ScanSession {
    pub fn new(
        config: ScanConfig,
        camera: Box<dyn MediaSource>,
        detector: Box<dyn BarcodeSource>,
        verifier: Arc<Verifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let stats = Arc::new(Mutex::new(SessionStats::new(config.session_id.clone())));

        Self {
            config,
            camera,
            detector,
            verifier,
            navigator,
            reassembler: ChunkReassembler::new(),
            stats,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Open the camera and run the session in the background
    ///
    /// A camera that cannot be opened fails here with
    /// `StreamAcquisitionFailed`, before any scanning starts.
    pub async fn start(mut self) -> Result<ScanHandle, ScanError> {
        info!(
            "Starting scan session {} (camera: {}, detector: {}, result page: {})",
            self.config.session_id,
            self.camera.name(),
            self.detector.name(),
            self.config.result_page
        );

        let frames = match self.camera.start(&self.config.constraints).await {
            Ok(frames) => frames,
            Err(e) => {
                error!("Error getting video stream: {:#}", e);
                self.release_camera().await;
                return Err(ScanError::StreamAcquisitionFailed(format!("{:#}", e)));
            }
        };

        let (cancel, signal) = CancelHandle::new();
        let stats = Arc::clone(&self.stats);
        let session_id = self.config.session_id.clone();
        let task = tokio::spawn(self.run(frames, signal));

        Ok(ScanHandle {
            session_id,
            cancel,
            stats,
            task: Mutex::new(Some(task)),
        })
    }

    /// Scan until a verdict or cancellation
    ///
    /// Returns `None` when cancelled. The camera is stopped on every path
    /// before this returns or the verdict is handed to the navigator.
    async fn run(
        mut self,
        mut frames: watch::Receiver<Option<Frame>>,
        mut cancel: CancelSignal,
    ) -> Option<Verdict> {
        let exit = self.scan_loop(&mut frames, &mut cancel).await;

        self.release_camera().await;
        self.reassembler.cancel();

        match exit {
            LoopExit::Cancelled => {
                {
                    let mut stats = self.stats.lock().await;
                    stats.state = ScanState::Cancelled;
                    stats.finished_at = Some(Utc::now());
                }
                info!("Scan session {} cancelled", self.config.session_id);
                None
            }
            LoopExit::Verdict(verdict) => {
                self.finish(&verdict).await;
                Some(verdict)
            }
        }
    }

    async fn scan_loop(
        &mut self,
        frames: &mut watch::Receiver<Option<Frame>>,
        cancel: &mut CancelSignal,
    ) -> LoopExit {
        loop {
            if cancel.is_cancelled() {
                return LoopExit::Cancelled;
            }

            self.set_state(ScanState::Scanning).await;
            let frame = frames.borrow_and_update().clone();

            if let Some(frame) = frame {
                self.stats.lock().await.ticks += 1;

                let detected = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return LoopExit::Cancelled,
                    result = self.detector.detect(&frame) => result,
                };

                match detected {
                    Ok(scans) if !scans.is_empty() => {
                        if let Some(verdict) = self.process(scans).await {
                            return LoopExit::Verdict(verdict);
                        }
                    }
                    Ok(_) | Err(DetectError::NoCodeFound) => {}
                    Err(e) => {
                        warn!("Barcode detection failed: {}", e);
                        self.stats.lock().await.detector_errors += 1;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return LoopExit::Cancelled,
                _ = tokio::time::sleep(self.config.detection_interval) => {}
            }
        }
    }

    /// Classify what the detector found; `Some` once the session is decided
    async fn process(&mut self, scans: Vec<RawScan>) -> Option<Verdict> {
        self.set_state(ScanState::Classifying).await;

        let (kind, scan) = scans
            .into_iter()
            .map(|scan| (classify(&scan.text), scan))
            .find(|(kind, _)| *kind != PayloadKind::Unknown)?;

        debug!("Scanned {} QR at {} ms", kind, scan.timestamp_ms);

        let payload = if kind == PayloadKind::MultiPartChunk {
            self.collect_chunk(&scan.text).await?
        } else {
            scan.text
        };

        // Nothing more to read from the camera once a payload is complete
        self.release_camera().await;

        self.set_state(ScanState::Decoding).await;
        let credential = match self.verifier.decode(kind, payload).await {
            Ok(credential) => credential,
            Err(verdict) => return Some(verdict),
        };

        self.set_state(ScanState::Verifying).await;
        Some(self.verifier.verify_decoded(credential))
    }

    /// Feed one chunk to the reassembler; `Some` with the joined payload once complete
    async fn collect_chunk(&mut self, text: &str) -> Option<String> {
        self.set_state(ScanState::Reassembling).await;

        let Some(envelope) = ChunkEnvelope::parse(text) else {
            debug!("Ignoring malformed multi-part chunk");
            return None;
        };

        match self.reassembler.accept(envelope) {
            ChunkOutcome::Stored {
                index,
                received,
                expected,
            } => {
                {
                    let mut stats = self.stats.lock().await;
                    stats.chunks_received = received;
                    stats.chunks_expected = Some(expected);
                }

                let message = format!("Received piece: {:02}", index);
                info!("{} ({} of {})", message, received, expected);
                if let Err(e) = self
                    .navigator
                    .report_progress(&self.config.session_id, &message)
                    .await
                {
                    warn!("Failed to report progress: {:#}", e);
                }
                None
            }
            ChunkOutcome::Duplicate { .. } | ChunkOutcome::Mismatched { .. } => None,
            ChunkOutcome::Complete(payload) => {
                let mut stats = self.stats.lock().await;
                if let Some(expected) = stats.chunks_expected {
                    stats.chunks_received = expected as usize;
                }
                Some(payload)
            }
        }
    }

    async fn finish(&mut self, verdict: &Verdict) {
        {
            let mut stats = self.stats.lock().await;
            stats.state = ScanState::Done;
            stats.finished_at = Some(Utc::now());
            stats.verdict = Some(verdict.status);
            stats.message = Some(verdict.message.clone());
        }

        info!(
            "Scan session {} done: {:?} ({})",
            self.config.session_id, verdict.status, verdict.message
        );

        let params = PageParams {
            session_id: self.config.session_id.clone(),
            screen_type: self.config.caller_type.clone(),
            verdict: verdict.clone(),
        };

        info!("Going to {}", self.config.result_page);
        if let Err(e) = self
            .navigator
            .goto_page(&self.config.result_page, params)
            .await
        {
            error!("Failed to deliver verdict: {:#}", e);
        }
    }

    async fn release_camera(&mut self) {
        if !self.camera.is_capturing() {
            return;
        }
        if let Err(e) = self.camera.stop().await {
            error!("Failed to stop camera: {:#}", e);
        }
    }

    async fn set_state(&self, state: ScanState) {
        self.stats.lock().await.state = state;
    }
}

/// Handle to a session running in the background
pub struct ScanHandle {
    session_id: String,
    cancel: CancelHandle,
    stats: Arc<Mutex<SessionStats>>,
    task: Mutex<Option<JoinHandle<Option<Verdict>>>>,
}

impl ScanHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Request cancellation; the session stops at its next suspension point
    pub fn cancel(&self) {
        info!("Cancelling scan session {}", self.session_id);
        self.cancel.cancel();
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let mut stats = self.stats.lock().await.clone();
        let end = stats.finished_at.unwrap_or_else(Utc::now);
        let duration = end.signed_duration_since(stats.started_at);
        stats.duration_secs = duration.num_milliseconds() as f64 / 1000.0;
        stats
    }

    /// When the session ended, `None` while it is still running
    pub async fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.stats.lock().await.finished_at
    }

    /// Wait for the session to end
    pub async fn wait(&self) -> Result<Option<Verdict>, ScanError> {
        self.wait_until(std::future::pending()).await
    }

    /// Wait for the session to end, cancelling it once `shutdown` resolves
    ///
    /// After cancelling, the same task is joined, so the camera has been
    /// released by the time this returns.
    pub async fn wait_until<F>(&self, shutdown: F) -> Result<Option<Verdict>, ScanError>
    where
        F: Future<Output = ()>,
    {
        let Some(mut task) = self.task.lock().await.take() else {
            return Err(ScanError::AlreadyFinished);
        };

        tokio::select! {
            joined = &mut task => return joined.map_err(|e| ScanError::Task(e.to_string())),
            _ = shutdown => self.cancel(),
        }

        task.await.map_err(|e| ScanError::Task(e.to_string()))
    }

    /// Cancel, wait for teardown and return final stats
    pub async fn stop(&self) -> SessionStats {
        self.cancel();
        match self.wait().await {
            Ok(_) | Err(ScanError::AlreadyFinished) => {}
            Err(e) => error!("Scan session {} failed: {}", self.session_id, e),
        }
        self.stats().await
    }

    pub async fn is_finished(&self) -> bool {
        match self.task.lock().await.as_ref() {
            Some(task) => task.is_finished(),
            None => true,
        }
    }
}
