use serde::{Deserialize, Serialize};

use crate::verify::VerdictStatus;

/// Verdict event published when a scan session ends
#[derive(Debug, Serialize, Deserialize)]
pub struct VerdictMessage {
    pub session_id: String,
    pub page: String,
    pub screen_type: String,
    pub status: VerdictStatus,
    pub message: String,
    /// `hcert`, `w3cvc` or `ukimmigration` when a credential was decoded
    pub credential_type: Option<String>,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Progress line while collecting multi-part codes
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub session_id: String,
    pub message: String,
    pub timestamp: String,  // RFC3339 timestamp
}
