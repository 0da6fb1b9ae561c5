use alloy_primitives::TxHash;

use crate::monitor::types::TransactionStatus;

/// One watch session: a caller-supplied hash and everything observed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub generation: u64,

    /// Hash the caller asked for. Stays fixed across replacements.
    pub watched: TxHash,

    /// Latest published snapshot. `status.hash` follows replacements.
    pub status: TransactionStatus,
}

#[derive(Debug, Default)]
pub struct EngineState {
    /// Last generation handed out. Bumped on every new session.
    pub generation: u64,
    pub session: Option<Session>,
    pub torn_down: bool,
}

impl EngineState {
    /// Returns the live session if `generation` still identifies it.
    pub fn current_mut(&mut self, generation: u64) -> Option<&mut Session> {
        if self.torn_down {
            return None;
        }
        self.session
            .as_mut()
            .filter(|s| s.generation == generation)
    }
}
