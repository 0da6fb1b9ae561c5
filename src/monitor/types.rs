use alloy_primitives::TxHash;
use serde::Serialize;
use thiserror::Error;

/// Lifecycle classification of a watched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Pending,
    Success,
    Failed,
}

/// Snapshot of what is currently known about a watched transaction.
///
/// Values are never mutated in place: every transition builds a new value,
/// so two snapshots can be compared with `==`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionStatus {
    pub state: TxState,
    /// Hash currently tracked. Follows replacements.
    pub hash: TxHash,
    pub confirmations: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionStatus {
    pub fn pending(hash: TxHash) -> Self {
        Self {
            state: TxState::Pending,
            hash,
            confirmations: 0,
            error: None,
        }
    }

    /// Marks the transaction failed, keeping hash and confirmation count.
    pub fn failed(&self, error: &ObservationError) -> Self {
        Self {
            state: TxState::Failed,
            hash: self.hash,
            confirmations: self.confirmations,
            error: Some(error.to_string()),
        }
    }

    /// Marks the transaction confirmed. A missing or zero count reads as one.
    pub fn confirmed(&self, count: Option<u64>) -> Self {
        Self {
            state: TxState::Success,
            hash: self.hash,
            confirmations: count.filter(|c| *c > 0).unwrap_or(1),
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == TxState::Pending
    }
}

/// Failure reported by the observation service. The description is shown
/// to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ObservationError(pub String);

impl ObservationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Payload of a confirmation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTx {
    pub hash: TxHash,
    pub block_number: Option<u64>,
}

/// Event delivered by a transaction subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Replaced(TxHash),
    Error(ObservationError),
    Confirmed(ConfirmedTx),
}

/// Errors surfaced to the owner of a [`TransactionWatcher`](crate::monitor::runtime::TransactionWatcher).
#[derive(Debug, Error)]
pub enum WatchError {
    /// The driver task is no longer running.
    #[error("watcher task has stopped")]
    Closed,
    /// The driver task panicked or was cancelled.
    #[error("watcher task failed: {0}")]
    Task(String),
}
