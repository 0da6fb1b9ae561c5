use std::fmt;

use alloy_primitives::TxHash;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::monitor::engine::WatchEvent;
use crate::monitor::types::{ConfirmedTx, ObservationError, ObservedEvent};

/// Chain observation capability consumed by the watcher.
/// Everything is transaction-hash based.
#[async_trait]
pub trait ObservationService: Send + Sync + 'static {
    /// Opens a subscription for `hash`. Events are pushed into `sink` until
    /// the returned handle is released.
    fn watch_transaction(
        &self,
        hash: TxHash,
        sink: EventSink,
    ) -> Result<SubscriptionHandle, ObservationError>;

    /// One-shot lookup of the confirmation count. `None` when the service
    /// has no figure for it.
    async fn confirmation_count(&self, hash: TxHash) -> Result<Option<u64>, ObservationError>;
}

/// Callback side of a subscription, bound to one watch session.
///
/// Cloneable so an implementation can hand it to its own background tasks.
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<WatchEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A different transaction now carries the same intent.
    pub fn replaced(&self, new_hash: TxHash) -> bool {
        self.emit(ObservedEvent::Replaced(new_hash))
    }

    pub fn error(&self, err: ObservationError) -> bool {
        self.emit(ObservedEvent::Error(err))
    }

    pub fn confirmed(&self, tx: ConfirmedTx) -> bool {
        self.emit(ObservedEvent::Confirmed(tx))
    }

    /// Returns `false` once the watcher is gone.
    pub fn emit(&self, event: ObservedEvent) -> bool {
        self.tx
            .send(WatchEvent::Observed {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Unsubscribe handle returned by [`ObservationService::watch_transaction`].
///
/// The release callback runs exactly once: on [`release`](Self::release) or
/// on drop, whichever happens first.
pub struct SubscriptionHandle {
    unwatch: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new<F: FnOnce() + Send + 'static>(unwatch: F) -> Self {
        Self {
            unwatch: Some(Box::new(unwatch)),
        }
    }

    /// Handle for services with nothing to tear down.
    pub fn noop() -> Self {
        Self { unwatch: None }
    }

    pub fn release(mut self) {
        self.run_unwatch();
    }

    fn run_unwatch(&mut self) {
        if let Some(unwatch) = self.unwatch.take() {
            unwatch();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.run_unwatch();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("live", &self.unwatch.is_some())
            .finish()
    }
}
