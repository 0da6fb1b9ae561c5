use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::TxHash;
use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::monitor::observer::api::{EventSink, ObservationService, SubscriptionHandle};
use crate::monitor::types::{ConfirmedTx, ObservationError};

/// Pure in-memory observation service.
///
/// Chain activity is injected by hand (`replace`, `confirm`, `fail`), which
/// makes it usable both for replaying recorded scenarios and for tests.
#[derive(Clone, Default)]
pub struct ScriptedObserver {
    inner: Arc<Mutex<Inner>>,

    /// When set, confirmation lookups wait for a permit.
    lookup_gate: Option<Arc<Semaphore>>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,

    /// subscription id -> (currently tracked hash, sink)
    subscribers: HashMap<u64, (TxHash, EventSink)>,

    confirmations: HashMap<TxHash, u64>,
    lookup_errors: HashMap<TxHash, ObservationError>,
    subscribe_errors: HashMap<TxHash, ObservationError>,

    /// History, for inspection
    opened: Vec<TxHash>,
    released: Vec<TxHash>,
    lookups: Vec<TxHash>,
}

impl ScriptedObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmation lookups block until [`open_lookups`](Self::open_lookups)
    /// lets them through.
    pub fn with_gated_lookups() -> Self {
        Self {
            inner: Arc::default(),
            lookup_gate: Some(Arc::new(Semaphore::new(0))),
        }
    }

    pub fn open_lookups(&self, n: usize) {
        if let Some(gate) = &self.lookup_gate {
            gate.add_permits(n);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ----- scripting -----

    pub fn set_confirmations(&self, hash: TxHash, count: u64) {
        self.lock().confirmations.insert(hash, count);
    }

    pub fn fail_lookup(&self, hash: TxHash, err: ObservationError) {
        self.lock().lookup_errors.insert(hash, err);
    }

    pub fn fail_subscribe(&self, hash: TxHash, err: ObservationError) {
        self.lock().subscribe_errors.insert(hash, err);
    }

    /// Announces that `new_hash` supersedes `hash`. Subscribers follow the
    /// new hash from then on. Returns how many subscribers were notified.
    pub fn replace(&self, hash: TxHash, new_hash: TxHash) -> usize {
        let mut inner = self.lock();
        let mut notified = 0;
        for (tracked, sink) in inner.subscribers.values_mut() {
            if *tracked == hash {
                *tracked = new_hash;
                if sink.replaced(new_hash) {
                    notified += 1;
                }
            }
        }
        log::debug!("[OBSERVER] replace {} -> {} ({} subscribers)", hash, new_hash, notified);
        notified
    }

    pub fn confirm(&self, hash: TxHash, block_number: Option<u64>) -> usize {
        self.deliver(hash, |sink| {
            sink.confirmed(ConfirmedTx { hash, block_number })
        })
    }

    pub fn fail(&self, hash: TxHash, err: ObservationError) -> usize {
        self.deliver(hash, |sink| sink.error(err.clone()))
    }

    fn deliver(&self, hash: TxHash, f: impl Fn(&EventSink) -> bool) -> usize {
        let inner = self.lock();
        let mut notified = 0;
        for (tracked, sink) in inner.subscribers.values() {
            if *tracked == hash && f(sink) {
                notified += 1;
            }
        }
        log::debug!("[OBSERVER] event for {} delivered to {} subscribers", hash, notified);
        notified
    }

    // ----- inspection -----

    pub fn live_subscriptions(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn opened(&self) -> Vec<TxHash> {
        self.lock().opened.clone()
    }

    pub fn released(&self) -> Vec<TxHash> {
        self.lock().released.clone()
    }

    pub fn lookups(&self) -> Vec<TxHash> {
        self.lock().lookups.clone()
    }
}

#[async_trait]
impl ObservationService for ScriptedObserver {
    fn watch_transaction(
        &self,
        hash: TxHash,
        sink: EventSink,
    ) -> Result<SubscriptionHandle, ObservationError> {
        let mut inner = self.lock();
        if let Some(err) = inner.subscribe_errors.get(&hash) {
            return Err(err.clone());
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.insert(id, (hash, sink));
        inner.opened.push(hash);
        log::debug!("[OBSERVER] subscription {} opened for {}", id, hash);

        let state = self.inner.clone();
        Ok(SubscriptionHandle::new(move || {
            let mut inner = state.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.subscribers.remove(&id).is_some() {
                inner.released.push(hash);
                log::debug!("[OBSERVER] subscription {} released", id);
            }
        }))
    }

    async fn confirmation_count(&self, hash: TxHash) -> Result<Option<u64>, ObservationError> {
        self.lock().lookups.push(hash);

        if let Some(gate) = &self.lookup_gate {
            gate.acquire()
                .await
                .map_err(|e| ObservationError::new(e.to_string()))?
                .forget();
        }

        let inner = self.lock();
        let result = match inner.lookup_errors.get(&hash) {
            Some(err) => Err(err.clone()),
            None => Ok(inner.confirmations.get(&hash).copied()),
        };
        result
    }
}
