use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{CameraConstraints, Frame, MediaSource};

/// Synthetic camera repeating one still frame at a fixed rate
///
/// With blank frames and a [`ReplayDetector`](crate::barcode::ReplayDetector)
/// it lets the pipeline run without camera hardware (batch verification,
/// tests). Fed a picture of a code, it drives the software decoder instead.
pub struct StillCamera {
    frame: Frame,
    frame_interval: Duration,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl StillCamera {
    /// Roughly 30 frames per second
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    pub fn new(frame_interval: Duration) -> Self {
        Self::with_frame(Frame::blank(0), frame_interval)
    }

    pub fn with_frame(frame: Frame, frame_interval: Duration) -> Self {
        Self {
            frame,
            frame_interval,
            live: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Camera showing the image at `path`
    pub fn from_image(path: impl AsRef<Path>, frame_interval: Duration) -> Result<Self> {
        Ok(Self::with_frame(load_frame(path)?, frame_interval))
    }

    /// Shared flag that stays `true` while the synthetic track is live
    pub fn track_state(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }
}

impl Default for StillCamera {
    fn default() -> Self {
        Self::new(Self::FRAME_INTERVAL)
    }
}

#[async_trait::async_trait]
impl MediaSource for StillCamera {
    async fn start(
        &mut self,
        constraints: &CameraConstraints,
    ) -> Result<watch::Receiver<Option<Frame>>> {
        if self.task.is_some() {
            bail!("Still camera already started");
        }

        info!("Starting still camera ({:?})", constraints);

        let still = self.frame.clone();
        let (tx, rx) = watch::channel(Some(still.clone()));
        let interval = self.frame_interval;
        let live = Arc::clone(&self.live);
        live.store(true, Ordering::SeqCst);

        self.task = Some(tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(interval);

            while live.load(Ordering::SeqCst) {
                ticker.tick().await;
                let frame = Frame {
                    timestamp_ms: started.elapsed().as_millis() as u64,
                    ..still.clone()
                };
                if tx.send(Some(frame)).is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Still camera stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "still-camera"
    }
}

impl Drop for StillCamera {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Decode an image file into a grayscale frame
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame> {
    let path = path.as_ref();
    let image = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_luma8();
    let (width, height) = image.dimensions();

    info!("Loaded {}x{} frame from {}", width, height, path.display());
    Ok(Frame::new(image.into_raw(), width, height, 0))
}
