use tracing::debug;

use crate::error::DetectError;

use super::source::PixelDecoder;

/// Software QR decoder backed by `rqrr`
///
/// Looks at the whole frame and returns the first grid that decodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl PixelDecoder for RqrrDecoder {
    fn decode(&self, luma: &[u8], width: u32, height: u32) -> Result<String, DetectError> {
        let (w, h) = (width as usize, height as usize);
        if luma.len() < w * h {
            return Err(DetectError::Detector(format!(
                "frame has {} bytes, expected {}x{}",
                luma.len(),
                w,
                h
            )));
        }

        let mut image = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);
        let grids = image.detect_grids();

        for grid in grids {
            match grid.decode() {
                Ok((_meta, text)) => return Ok(text),
                // Partly visible or blurred codes are routine on a live feed
                Err(e) => debug!("Skipping unreadable QR grid: {}", e),
            }
        }

        Err(DetectError::NoCodeFound)
    }
}
