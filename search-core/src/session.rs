use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;

use crate::mode::QueryMode;

/// Signed-in caller, as far as search is concerned.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: String,
    pub access_token: String,
    /// Whether the viewer's own account is listed in directory search.
    #[serde(default)]
    pub discoverable: bool,
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("discoverable", &self.discoverable)
            .finish()
    }
}

/// One dispatched query.
#[derive(Debug, Clone)]
pub struct QuerySession {
    pub sequence: u64,
    pub raw_input: String,
    pub term: String,
    pub mode: QueryMode,
    pub issued_at: Instant,
    pub viewer: Option<Viewer>,
}

/// Monotonic sequence allocator and staleness check.
///
/// Results are never cancelled in flight; they are dropped on arrival when
/// their sequence is older than the latest one handed out.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    last: u64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the sequence for a new dispatch.
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Invalidates everything in flight without dispatching anything.
    pub fn supersede(&mut self) {
        self.last += 1;
    }

    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn is_stale(&self, sequence: u64) -> bool {
        sequence < self.last
    }
}
