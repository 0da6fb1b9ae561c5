//! Transaction watch decision engine.
//!
//! This module implements the **Functional Core** of the transaction monitor.
//! It acts as a pure state machine:
//! - **Input**: `WatchEvent` (caller requests, subscription callbacks, lookup results).
//! - **Output**: `Vec<WatchCommand>` (side effects to be executed by the driver).
//!
//! # Architecture guarantees
//! * **No Network**: This module never talks to the observation service itself.
//! * **No Async**: All functions are blocking and CPU-bound (and fast).
//! * **Deterministic**: Given the same sequence of events, the output is always identical.
//!
//! Every session gets a fresh generation number. Callbacks and lookups carry
//! the generation they were issued under, and anything that does not match the
//! live session is dropped.

pub mod state;
mod logic;
pub mod types;


pub use crate::monitor::engine::types::{WatchCommand, WatchEvent};

use crate::monitor::types::TransactionStatus;

use state::EngineState;

/// The watcher's "Brain".
///
/// `WatchEngine` decides when to subscribe, when to release, when to ask for
/// a confirmation count and what status to publish.
#[derive(Debug, Default)]
pub struct WatchEngine {
    state: EngineState,
}

impl WatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main event handler.
    ///
    /// Consumes an event and returns the commands the driver must execute,
    /// in order.
    pub fn handle_event(&mut self, event: WatchEvent) -> Vec<WatchCommand> {
        match event {
            WatchEvent::HashChanged(hash) => logic::on_hash_changed(&mut self.state, hash),
            WatchEvent::Observed { generation, event } => {
                logic::on_observed(&mut self.state, generation, event)
            }
            WatchEvent::ConfirmationsFetched { generation, result } => {
                logic::on_confirmations_fetched(&mut self.state, generation, result)
            }
            WatchEvent::Teardown => logic::on_teardown(&mut self.state),
        }
    }

    /// Latest status, `None` while idle.
    pub fn status(&self) -> Option<&TransactionStatus> {
        self.state.session.as_ref().map(|s| &s.status)
    }

    /// Generation of the live session, if any.
    pub fn generation(&self) -> Option<u64> {
        self.state.session.as_ref().map(|s| s.generation)
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.torn_down
    }
}
