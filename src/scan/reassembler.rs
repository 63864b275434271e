use std::collections::BTreeSet;
use tracing::{debug, info};

use super::envelope::ChunkEnvelope;

/// Result of feeding one envelope to the reassembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// New piece stored; transmission still incomplete
    Stored {
        index: u32,
        received: usize,
        expected: u32,
    },
    /// Index already seen (the camera re-read the same frame)
    Duplicate { index: u32 },
    /// Envelope belongs to a transmission of a different size
    Mismatched { expected: u32, got: u32 },
    /// Every slot filled; joined payload in index order
    Complete(String),
}

/// State of one multi-part transmission
#[derive(Debug, Clone)]
pub struct ReassemblySession {
    expected_count: u32,
    seen_indices: BTreeSet<u32>,
    slots: Vec<Option<String>>,
}

impl ReassemblySession {
    fn new(expected_count: u32) -> Self {
        Self {
            expected_count,
            seen_indices: BTreeSet::new(),
            slots: vec![None; expected_count as usize],
        }
    }

    pub fn expected_count(&self) -> u32 {
        self.expected_count
    }

    pub fn received(&self) -> usize {
        self.seen_indices.len()
    }

    pub fn is_complete(&self) -> bool {
        self.seen_indices.len() == self.expected_count as usize
            && self.slots.iter().all(Option::is_some)
    }

    fn join(self) -> String {
        self.slots.into_iter().flatten().collect()
    }
}

/// Merges independently scanned chunks into one payload
///
/// Idle until the first envelope arrives; that envelope fixes the expected
/// count. Completion is all-or-nothing: nothing is emitted until every index
/// `0..expected` has been stored, and the reassembler is idle again afterwards.
#[derive(Debug, Default)]
pub struct ChunkReassembler {
    session: Option<ReassemblySession>,
}

impl ChunkReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, envelope: ChunkEnvelope) -> ChunkOutcome {
        let session = self.session.get_or_insert_with(|| {
            info!("Starting multi-part reassembly ({} pieces)", envelope.total_count);
            ReassemblySession::new(envelope.total_count)
        });

        if envelope.total_count != session.expected_count {
            debug!(
                "Ignoring chunk from a {}-piece group (collecting {})",
                envelope.total_count, session.expected_count
            );
            return ChunkOutcome::Mismatched {
                expected: session.expected_count,
                got: envelope.total_count,
            };
        }

        if session.seen_indices.contains(&envelope.index) {
            return ChunkOutcome::Duplicate {
                index: envelope.index,
            };
        }

        let Some(slot) = session.slots.get_mut(envelope.index as usize) else {
            return ChunkOutcome::Mismatched {
                expected: session.expected_count,
                got: envelope.total_count,
            };
        };
        *slot = Some(envelope.data);
        session.seen_indices.insert(envelope.index);

        if session.is_complete() {
            let expected = session.expected_count;
            let payload = self.session.take().map(ReassemblySession::join).unwrap_or_default();
            info!("Received all {} pieces ({} bytes)", expected, payload.len());
            return ChunkOutcome::Complete(payload);
        }

        ChunkOutcome::Stored {
            index: envelope.index,
            received: session.received(),
            expected: session.expected_count,
        }
    }

    /// Drop any in-flight transmission without emitting anything
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                "Discarding partial reassembly ({} of {} pieces)",
                session.received(),
                session.expected_count
            );
        }
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    pub fn session(&self) -> Option<&ReassemblySession> {
        self.session.as_ref()
    }
}
