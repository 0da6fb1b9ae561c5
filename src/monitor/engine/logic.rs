use alloy_primitives::TxHash;

use crate::monitor::engine::state::{EngineState, Session};
use crate::monitor::engine::types::WatchCommand;
use crate::monitor::types::{ObservationError, ObservedEvent, TransactionStatus};

pub fn on_hash_changed(state: &mut EngineState, hash: Option<TxHash>) -> Vec<WatchCommand> {
    if state.torn_down {
        log::debug!("[ENGINE] hash change after teardown ignored");
        return Vec::new();
    }

    let current = state.session.as_ref().map(|s| s.watched);
    if current == hash {
        return Vec::new();
    }

    let mut cmds = Vec::new();

    // The old subscription must go before anything of the next session.
    if let Some(old) = state.session.take() {
        log::info!(
            "[ENGINE] closing session #{} ({})",
            old.generation,
            old.watched
        );
        cmds.push(WatchCommand::Unsubscribe {
            generation: old.generation,
        });
    }

    match hash {
        Some(hash) => {
            state.generation += 1;
            let generation = state.generation;
            let status = TransactionStatus::pending(hash);

            log::info!("[ENGINE] opening session #{} for {}", generation, hash);

            state.session = Some(Session {
                generation,
                watched: hash,
                status: status.clone(),
            });

            cmds.push(WatchCommand::Publish(Some(status)));
            cmds.push(WatchCommand::Subscribe { generation, hash });
        }
        None => {
            cmds.push(WatchCommand::Publish(None));
        }
    }

    cmds
}

pub fn on_observed(
    state: &mut EngineState,
    generation: u64,
    event: ObservedEvent,
) -> Vec<WatchCommand> {
    let Some(session) = state.current_mut(generation) else {
        log::debug!("[ENGINE] stale event from session #{} dropped: {:?}", generation, event);
        return Vec::new();
    };

    match event {
        ObservedEvent::Replaced(new_hash) => {
            log::info!(
                "[ENGINE] session #{}: {} replaced by {}",
                generation,
                session.status.hash,
                new_hash
            );
            publish(session, TransactionStatus::pending(new_hash))
        }
        ObservedEvent::Error(err) => {
            log::warn!("[ENGINE] session #{}: observation error: {}", generation, err);
            let next = session.status.failed(&err);
            publish(session, next)
        }
        ObservedEvent::Confirmed(tx) => {
            log::debug!(
                "[ENGINE] session #{}: confirmed {} (block {:?}), looking up confirmations",
                generation,
                tx.hash,
                tx.block_number
            );
            vec![WatchCommand::LookupConfirmations {
                generation,
                hash: session.status.hash,
            }]
        }
    }
}

pub fn on_confirmations_fetched(
    state: &mut EngineState,
    generation: u64,
    result: Result<Option<u64>, ObservationError>,
) -> Vec<WatchCommand> {
    let Some(session) = state.current_mut(generation) else {
        log::debug!("[ENGINE] stale confirmation lookup from session #{} dropped", generation);
        return Vec::new();
    };

    let next = match result {
        Ok(count) => session.status.confirmed(count),
        Err(err) => {
            log::warn!("[ENGINE] session #{}: confirmation lookup failed: {}", generation, err);
            session.status.failed(&err)
        }
    };

    publish(session, next)
}

pub fn on_teardown(state: &mut EngineState) -> Vec<WatchCommand> {
    if state.torn_down {
        return Vec::new();
    }
    state.torn_down = true;

    match state.session.take() {
        Some(old) => {
            log::info!("[ENGINE] teardown, closing session #{}", old.generation);
            vec![WatchCommand::Unsubscribe {
                generation: old.generation,
            }]
        }
        None => Vec::new(),
    }
}

/// Last write wins: every accepted event replaces the snapshot.
fn publish(session: &mut Session, next: TransactionStatus) -> Vec<WatchCommand> {
    session.status = next.clone();
    vec![WatchCommand::Publish(Some(next))]
}
