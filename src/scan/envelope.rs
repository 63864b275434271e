use serde::{Deserialize, Serialize};

use super::classifier::MULTI_PART_PREFIX;

/// One frame of a multi-part transmission: `multi|w3cvc|TT|II|<data>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEnvelope {
    /// Number of frames in the transmission (`TT`)
    pub total_count: u32,
    /// Position of this frame (`II`), `0 <= index < total_count`
    pub index: u32,
    /// Slice of the encoded credential
    pub data: String,
}

impl ChunkEnvelope {
    /// Parse a scanned chunk
    ///
    /// Returns `None` for anything malformed (missing fields, non-digit
    /// counters, empty group, index out of range). A blurred frame is
    /// expected noise, so the caller just skips it.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix(MULTI_PART_PREFIX)?;
        let mut fields = rest.splitn(3, '|');

        let total_count = two_digits(fields.next()?)?;
        let index = two_digits(fields.next()?)?;
        let data = fields.next()?;

        if total_count == 0 || index >= total_count {
            return None;
        }

        Some(Self {
            total_count,
            index,
            data: data.to_string(),
        })
    }
}

fn two_digits(field: &str) -> Option<u32> {
    match field.as_bytes() {
        [hi, lo] if hi.is_ascii_digit() && lo.is_ascii_digit() => {
            Some(u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
        }
        _ => None,
    }
}
