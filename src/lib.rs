pub mod barcode;
pub mod camera;
pub mod config;
pub mod credential;
pub mod error;
pub mod fetch;
pub mod http;
pub mod nats;
pub mod navigation;
pub mod pipeline;
pub mod scan;
pub mod session;
pub mod store;
pub mod verify;

pub use barcode::{BarcodeSource, BarcodeSourceFactory, RawScan, ReplayDetector, RqrrDecoder};
pub use camera::{CameraConstraints, FacingMode, Frame, MediaSource, StillCamera};
pub use config::Config;
pub use credential::{CredentialDecoder, DecodedCredential, HcertCodec, JwsVerifier};
pub use error::{DecodeError, DetectError, FetchError, HcertError, ScanError};
pub use fetch::{Fetcher, HttpFetcher, UrlRewriteRule};
pub use http::{create_router, AppState};
pub use nats::{NatsClient, NatsNavigator, ProgressMessage, VerdictMessage};
pub use navigation::{ChannelNavigator, LogNavigator, Navigation, Navigator, PageParams};
pub use pipeline::Pipeline;
pub use scan::{classify, ChunkEnvelope, ChunkReassembler, PayloadKind};
pub use session::{ScanConfig, ScanHandle, ScanSession, ScanState, SessionStats};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use verify::{BusinessRules, StandardRules, Verdict, VerdictStatus, Verifier};
