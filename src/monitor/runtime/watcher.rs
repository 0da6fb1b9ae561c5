use std::sync::Arc;

use alloy_primitives::TxHash;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::monitor::observer::ObservationService;
use crate::monitor::runtime::driver::{StatusUpdate, WatchDriver, WatchRequest};
use crate::monitor::types::{TransactionStatus, WatchError};

/// Caller-facing handle of a watch session.
///
/// Dropping it tears the session down and releases any open subscription.
pub struct TransactionWatcher {
    requests: mpsc::UnboundedSender<WatchRequest>,
    task: JoinHandle<()>,
}

impl TransactionWatcher {
    /// Spawns the driver task on the current tokio runtime.
    pub fn spawn<O: ObservationService>(observer: Arc<O>) -> (Self, StatusStream) {
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let driver = WatchDriver::new(observer, updates);
        let task = tokio::spawn(driver.run(requests_rx));

        (
            Self { requests, task },
            StatusStream {
                rx: updates_rx,
                latest: None,
            },
        )
    }

    /// Starts watching `hash`, or stops watching when `None`.
    pub fn watch(&self, hash: Option<TxHash>) -> Result<(), WatchError> {
        self.requests
            .send(WatchRequest::Watch(hash))
            .map_err(|_| WatchError::Closed)
    }

    /// Tears the session down and waits for the driver to finish.
    pub async fn shutdown(self) -> Result<(), WatchError> {
        let Self { requests, task } = self;
        drop(requests);
        task.await.map_err(|e| WatchError::Task(e.to_string()))
    }
}

/// Ordered stream of status updates.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::UnboundedReceiver<StatusUpdate>,
    latest: StatusUpdate,
}

impl StatusStream {
    /// Waits for the next update. `None` once the watcher has stopped.
    pub async fn next(&mut self) -> Option<StatusUpdate> {
        let update = self.rx.recv().await?;
        self.latest = update.clone();
        Some(update)
    }

    /// Next update if one is already queued.
    pub fn try_next(&mut self) -> Option<StatusUpdate> {
        let update = self.rx.try_recv().ok()?;
        self.latest = update.clone();
        Some(update)
    }

    /// Most recent status handed out by `next`/`try_next`.
    pub fn latest(&self) -> Option<&TransactionStatus> {
        self.latest.as_ref()
    }
}
