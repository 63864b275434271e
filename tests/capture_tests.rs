// Tests for camera and barcode source abstractions

mod common;

use anyhow::Result;
use common::{NullNavigator, HC1_VALID};
use credscan::barcode::{
    BarcodeSource, BarcodeSourceFactory, PixelDecoder, PlatformDetector, ReplayDetector,
    RqrrDecoder,
};
use credscan::camera::{load_frame, CameraConstraints, Frame, MediaSource, StillCamera};
use credscan::error::DetectError;
use credscan::pipeline::{DetectorFactory, MediaFactory, Pipeline};
use credscan::store::MemoryStore;
use credscan::verify::VerdictStatus;
use qrcode::{Color, QrCode};
use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, NamedTempFile};

struct FixedPlatformDetector(Vec<&'static str>);

#[async_trait::async_trait]
impl PlatformDetector for FixedPlatformDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

/// Decodes a frame whose first pixel is non-zero
struct FirstPixelDecoder;

impl PixelDecoder for FirstPixelDecoder {
    fn decode(&self, luma: &[u8], _width: u32, _height: u32) -> Result<String, DetectError> {
        match luma.first() {
            Some(&value) if value > 0 => Ok(format!("code-{}", value)),
            _ => Err(DetectError::NoCodeFound),
        }
    }
}

/// Render `text` as a QR code, 4 px per module with a 4-module quiet zone
fn rendered_code(text: &str) -> Frame {
    const SCALE: usize = 4;
    const QUIET: usize = 4;

    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let size = (modules + 2 * QUIET) * SCALE;
    let mut luma = vec![255u8; size * size];

    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules + QUIET, i / modules + QUIET);
        for dy in 0..SCALE {
            let row = (my * SCALE + dy) * size;
            luma[row + mx * SCALE..row + (mx + 1) * SCALE].fill(0);
        }
    }

    Frame::new(luma, size as u32, size as u32, 0)
}

#[test]
fn test_frame_creation() {
    let frame = Frame::new(vec![1, 2, 3, 4], 2, 2, 1000);

    assert_eq!(frame.luma.len(), 4);
    assert_eq!(frame.width, 2);
    assert_eq!(frame.height, 2);
    assert_eq!(frame.timestamp_ms, 1000);

    let blank = Frame::blank(5);
    assert_eq!(blank.luma.len(), 1);
    assert_eq!(blank.timestamp_ms, 5);
}

#[tokio::test]
async fn test_factory_prefers_native_detector() {
    let native: Arc<dyn PlatformDetector> = Arc::new(FixedPlatformDetector(vec!["HC1:a", "HC1:b"]));
    let mut source = BarcodeSourceFactory::create(Some(native), Arc::new(FirstPixelDecoder));

    assert_eq!(source.name(), "native");

    let scans = source.detect(&Frame::blank(42)).await.unwrap();
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0].text, "HC1:a");
    assert_eq!(scans[1].timestamp_ms, 42);
}

#[tokio::test]
async fn test_factory_falls_back_to_pixel_decoder() {
    let mut source = BarcodeSourceFactory::create(None, Arc::new(FirstPixelDecoder));
    assert_eq!(source.name(), "fallback");

    let scans = source.detect(&Frame::new(vec![7], 1, 1, 3)).await.unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].text, "code-7");

    let err = source.detect(&Frame::blank(4)).await.unwrap_err();
    assert!(matches!(err, DetectError::NoCodeFound));
}

#[tokio::test]
async fn test_replay_detector_pops_one_payload_per_call() {
    let mut detector = ReplayDetector::new(["first", "second"]);
    assert_eq!(detector.remaining(), 2);

    let frame = Frame::blank(0);
    assert_eq!(detector.detect(&frame).await.unwrap()[0].text, "first");
    assert_eq!(detector.detect(&frame).await.unwrap()[0].text, "second");
    assert!(detector.detect(&frame).await.unwrap().is_empty());
}

#[test]
fn test_replay_detector_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "# scripted payloads")?;
    writeln!(file, "HC1:abc")?;
    writeln!(file)?;
    writeln!(file, "  multi|w3cvc|02|00|xy  ")?;

    let detector = ReplayDetector::from_file(file.path())?;
    assert_eq!(detector.remaining(), 2);

    assert!(ReplayDetector::from_file("/nonexistent/script.txt").is_err());

    Ok(())
}

#[tokio::test]
async fn test_still_camera_lifecycle() -> Result<()> {
    let mut camera = StillCamera::new(Duration::from_millis(1));
    let track = camera.track_state();
    assert!(!camera.is_capturing());

    let mut frames = camera.start(&CameraConstraints::default()).await?;
    assert!(camera.is_capturing());
    assert!(track.load(Ordering::SeqCst));

    // Frames keep arriving; only the latest is kept
    frames.changed().await?;
    assert!(frames.borrow().is_some());

    assert!(camera.start(&CameraConstraints::default()).await.is_err());

    camera.stop().await?;
    assert!(!camera.is_capturing());
    assert!(!track.load(Ordering::SeqCst));

    // Stopping twice is harmless
    camera.stop().await?;

    Ok(())
}

#[test]
fn test_rqrr_decoder_reads_rendered_code() {
    let frame = rendered_code(HC1_VALID);

    let text = RqrrDecoder
        .decode(&frame.luma, frame.width, frame.height)
        .unwrap();
    assert_eq!(text, HC1_VALID);

    // Nothing to find in an empty frame
    let blank = Frame::new(vec![255; 64 * 64], 64, 64, 0);
    let err = RqrrDecoder
        .decode(&blank.luma, blank.width, blank.height)
        .unwrap_err();
    assert!(matches!(err, DetectError::NoCodeFound));

    // Buffer too short for the claimed size
    let err = RqrrDecoder.decode(&[0; 10], 64, 64).unwrap_err();
    assert!(matches!(err, DetectError::Detector(_)));
}

#[tokio::test]
async fn test_still_camera_serves_image_to_software_decoder() -> Result<()> {
    let code = rendered_code("multi|w3cvc|02|01|tail");
    let dir = tempdir()?;
    let path = dir.path().join("code.png");
    image::GrayImage::from_raw(code.width, code.height, code.luma.to_vec())
        .unwrap()
        .save(&path)?;

    let loaded = load_frame(&path)?;
    assert_eq!((loaded.width, loaded.height), (code.width, code.height));
    assert!(load_frame(dir.path().join("missing.png")).is_err());

    let mut camera = StillCamera::from_image(&path, Duration::from_millis(1))?;
    let mut frames = camera.start(&CameraConstraints::default()).await?;
    frames.changed().await?;
    let frame = frames.borrow().clone().unwrap();
    assert_eq!(frame.width, code.width);

    let mut source = BarcodeSourceFactory::create(None, Arc::new(RqrrDecoder));
    let scans = source.detect(&frame).await.unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].text, "multi|w3cvc|02|01|tail");
    assert_eq!(scans[0].timestamp_ms, frame.timestamp_ms);

    camera.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_scan_decodes_code_from_camera_pixels() -> Result<()> {
    let code = rendered_code(HC1_VALID);
    let verifier = Arc::new(common::verifier(Arc::new(MemoryStore::new())));
    let media: MediaFactory = Arc::new(move || {
        let camera = StillCamera::with_frame(code.clone(), Duration::from_millis(1));
        Ok(Box::new(camera) as Box<dyn MediaSource>)
    });
    let detector: DetectorFactory =
        Arc::new(|| Ok(BarcodeSourceFactory::create(None, Arc::new(RqrrDecoder))));

    let pipeline = Pipeline::new(verifier, Arc::new(NullNavigator), media, detector)
        .with_detection_interval(Duration::from_millis(1));

    let handle = pipeline.start_scan("DisplayHcert", "").await?;
    let verdict = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await??
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Ok);
    assert_eq!(handle.stats().await.detector_errors, 0);

    Ok(())
}
