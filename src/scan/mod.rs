//! Payload classification and multi-part reassembly

pub mod classifier;
pub mod envelope;
pub mod reassembler;

pub use classifier::{classify, PayloadKind, HC1_PREFIX, MULTI_PART_PREFIX, URL_PREFIX};
pub use envelope::ChunkEnvelope;
pub use reassembler::{ChunkOutcome, ChunkReassembler, ReassemblySession};
