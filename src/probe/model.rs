use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single successful round trip to the backend. "Successful"
/// means an HTTP response came back at all; `ok` tells whether the status
/// was in the 2xx range. Produced once per invocation, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub status_code: u16,
    pub ok: bool,
    pub body_bytes: usize,
    pub duration_ms: u64,
    pub probed_at: DateTime<Utc>,
}
