use crate::monitor::engine::{WatchCommand, WatchEngine, WatchEvent};
use crate::monitor::observer::{EventSink, ObservationService, SubscriptionHandle};
use crate::monitor::types::{ObservedEvent, TransactionStatus};

use alloy_primitives::TxHash;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use std::sync::Arc;
use std::time::Instant;

/// Value pushed to the caller on every status change. `None` means nothing
/// is being watched.
pub type StatusUpdate = Option<TransactionStatus>;

/// Requests sent FROM the caller TO the driver task.
#[derive(Debug, Clone)]
pub enum WatchRequest {
    Watch(Option<TxHash>),
}

/// **WatchDriver**
///
/// Imperative shell around [`WatchEngine`]. It:
/// 1. Feeds caller requests and observation callbacks into the engine.
/// 2. Executes the commands the engine emits (subscribe, release, lookup, publish).
/// 3. Exclusively owns the live subscription handle.
pub struct WatchDriver<O> {
    engine: WatchEngine,
    observer: Arc<O>,

    /// Live subscription and the session it belongs to.
    subscription: Option<(u64, SubscriptionHandle)>,

    /// In-flight confirmation lookups per session.
    lookups: Vec<(u64, JoinHandle<()>)>,

    /// Observation callbacks and lookup results funnel through here.
    events_tx: mpsc::UnboundedSender<WatchEvent>,
    events_rx: mpsc::UnboundedReceiver<WatchEvent>,

    updates: mpsc::UnboundedSender<StatusUpdate>,

    t0: Instant,
}

impl<O> WatchDriver<O>
where
    O: ObservationService,
{
    pub fn new(observer: Arc<O>, updates: mpsc::UnboundedSender<StatusUpdate>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine: WatchEngine::new(),
            observer,
            subscription: None,
            lookups: Vec::new(),
            events_tx,
            events_rx,
            updates,
            t0: Instant::now(),
        }
    }

    fn t(&self) -> u128 {
        self.t0.elapsed().as_micros()
    }

    /// Main loop. Runs until the request channel closes, then tears the
    /// session down.
    ///
    /// Callbacks already delivered when a request arrives are applied before
    /// it, so a hash change or shutdown never skips an event of the session
    /// it ends.
    pub async fn run(mut self, mut requests: mpsc::UnboundedReceiver<WatchRequest>) {
        self.info("starting driver");

        loop {
            tokio::select! {
                req = requests.recv() => {
                    self.drain_events();
                    match req {
                        Some(WatchRequest::Watch(hash)) => self.set_hash(hash),
                        None => break,
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    self.process_engine(event);
                }
            }
        }

        self.teardown();
        self.info("driver stopped");
    }

    pub fn set_hash(&mut self, hash: Option<TxHash>) {
        self.process_engine(WatchEvent::HashChanged(hash));
    }

    pub fn teardown(&mut self) {
        self.process_engine(WatchEvent::Teardown);
    }

    /// Applies every event already sitting in the channel.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.process_engine(event);
        }
    }

    /// Feeds an event into the engine and executes all resulting commands.
    pub fn process_engine(&mut self, event: WatchEvent) {
        let mut queue = vec![event];

        while let Some(ev) = queue.pop() {
            self.trace(&format!("engine.handle_event({:?})", ev));

            let cmds = self.engine.handle_event(ev);

            for cmd in cmds {
                self.execute_command(cmd, &mut queue);
            }
        }
    }

    fn execute_command(&mut self, cmd: WatchCommand, queue: &mut Vec<WatchEvent>) {
        self.trace(&format!("cmd: {:?}", cmd));
        match cmd {
            WatchCommand::Unsubscribe { generation } => {
                self.release(generation);
            }

            WatchCommand::Subscribe { generation, hash } => {
                if let Some((stale, handle)) = self.subscription.take() {
                    log::error!(
                        "[DRIVER] session #{} still subscribed while opening #{}",
                        stale,
                        generation
                    );
                    handle.release();
                }

                let sink = EventSink::new(generation, self.events_tx.clone());
                match self.observer.watch_transaction(hash, sink) {
                    Ok(handle) => {
                        self.info(&format!("subscribed #{} to {}", generation, hash));
                        self.subscription = Some((generation, handle));
                    }
                    Err(err) => {
                        log::warn!("[DRIVER] subscribe for {} failed: {}", hash, err);
                        queue.push(WatchEvent::Observed {
                            generation,
                            event: ObservedEvent::Error(err),
                        });
                    }
                }
            }

            WatchCommand::LookupConfirmations { generation, hash } => {
                let observer = self.observer.clone();
                let events = self.events_tx.clone();

                let task = tokio::spawn(async move {
                    let result = observer.confirmation_count(hash).await;
                    // Receiver gone means the driver stopped; nothing to apply.
                    let _ = events.send(WatchEvent::ConfirmationsFetched { generation, result });
                });

                self.lookups.retain(|(_, t)| !t.is_finished());
                self.lookups.push((generation, task));
            }

            WatchCommand::Publish(status) => {
                self.debug(&format!("publish {:?}", status));
                if self.updates.send(status).is_err() {
                    log::debug!("[DRIVER] status receiver dropped");
                }
            }
        }
    }

    /// Releases the subscription of `generation` and cancels its lookups.
    fn release(&mut self, generation: u64) {
        match self.subscription.take() {
            Some((live, handle)) if live == generation => {
                handle.release();
                self.info(&format!("released #{}", generation));
            }
            Some(other) => {
                log::error!(
                    "[DRIVER] release for #{} but #{} is live",
                    generation,
                    other.0
                );
                self.subscription = Some(other);
            }
            // Subscribing may have failed
            None => {}
        }

        self.lookups.retain(|(g, task)| {
            if *g == generation {
                task.abort();
                false
            } else {
                !task.is_finished()
            }
        });
    }

    /// Drains events until none arrive for a short while.
    /// STRICTLY FOR TESTING.
    #[cfg(test)]
    pub async fn run_until_idle(&mut self) {
        use std::time::Duration;

        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(20), self.events_rx.recv()).await
        {
            self.process_engine(event);
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &WatchEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    fn info(&self, msg: &str) {
        log::info!("[DRIVER] {:>8}us: {}", self.t(), msg);
    }

    fn debug(&self, msg: &str) {
        log::debug!("[DRIVER] {:>8}us: {}", self.t(), msg);
    }

    fn trace(&self, msg: &str) {
        log::trace!("[DRIVER] {:>8}us: {}", self.t(), msg);
    }
}
