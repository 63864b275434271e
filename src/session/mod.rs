//! Scan session management
//!
//! This module provides the `ScanSession` abstraction that drives:
//! - Camera stream lifetime
//! - Paced barcode detection
//! - Payload classification and multi-part reassembly
//! - Decoding, verification and verdict delivery
//! - Cooperative cancellation and session statistics

mod cancel;
mod config;
mod session;
mod stats;

pub use cancel::{CancelHandle, CancelSignal};
pub use config::ScanConfig;
pub use session::{ScanHandle, ScanSession};
pub use stats::{ScanState, SessionStats};
