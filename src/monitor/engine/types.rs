use alloy_primitives::TxHash;

use crate::monitor::types::{ObservationError, ObservedEvent, TransactionStatus};

#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Caller supplied a new (or absent) hash to watch.
    HashChanged(Option<TxHash>),
    /// Subscription callback fired for the session `generation`.
    Observed {
        generation: u64,
        event: ObservedEvent,
    },
    /// Confirmation-count lookup issued under `generation` completed.
    ConfirmationsFetched {
        generation: u64,
        result: Result<Option<u64>, ObservationError>,
    },
    /// Owner went away.
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Unsubscribe { generation: u64 },
    Subscribe { generation: u64, hash: TxHash },
    LookupConfirmations { generation: u64, hash: TxHash },
    Publish(Option<TransactionStatus>),
}
