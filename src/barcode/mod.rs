pub mod pixels;
pub mod replay;
pub mod source;

pub use pixels::RqrrDecoder;
pub use replay::ReplayDetector;
pub use source::{
    BarcodeSource, BarcodeSourceFactory, FallbackDetector, NativeDetector, PixelDecoder,
    PlatformDetector, RawScan,
};
