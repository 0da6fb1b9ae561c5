//! Replays a recorded sequence of chain events through a live watcher.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "watch": "0xaaaa…" },
//!   { "replaced": "0xbbbb…" },
//!   { "confirm": { "confirmations": 3 } },
//!   { "error": "insufficient gas" },
//!   "clear"
//! ]
//! ```
//!
//! `replaced`, `confirm`, `error` and `lookup_error` act on the hash the
//! watcher currently tracks.

use std::path::Path;
use std::time::Duration;

use alloy_primitives::TxHash;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::monitor::observer::ScriptedObserver;
use crate::monitor::runtime::{StatusStream, StatusUpdate, TransactionWatcher};
use crate::monitor::types::ObservationError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Watch(TxHash),
    Clear,
    Replaced(TxHash),
    Confirm {
        #[serde(default)]
        confirmations: Option<u64>,
        #[serde(default)]
        block_number: Option<u64>,
    },
    Error(String),
    LookupError(String),
}

pub fn parse_script(json: &str) -> Result<Vec<ReplayStep>> {
    serde_json::from_str(json).context("invalid replay script")
}

pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading replay script {}", path.display()))?;
    parse_script(&raw)
}

/// Drives `watcher` through `steps`, calling `on_update` for every status
/// update in order. After each step, waits until no update has arrived for
/// `settle`.
///
/// Returns the number of updates observed.
pub async fn replay<F>(
    steps: &[ReplayStep],
    observer: &ScriptedObserver,
    watcher: &TransactionWatcher,
    stream: &mut StatusStream,
    settle: Duration,
    mut on_update: F,
) -> Result<usize>
where
    F: FnMut(&StatusUpdate),
{
    let mut seen = 0;

    for (i, step) in steps.iter().enumerate() {
        log::debug!("[REPLAY] step {}: {:?}", i, step);
        let tracked = stream.latest().map(|s| s.hash);

        match step {
            ReplayStep::Watch(hash) => watcher.watch(Some(*hash))?,
            ReplayStep::Clear => watcher.watch(None)?,
            other => match tracked {
                Some(hash) => apply_chain_event(observer, hash, other),
                None => log::warn!("[REPLAY] step {} skipped: nothing is being watched", i),
            },
        }

        while let Ok(Some(update)) = tokio::time::timeout(settle, stream.next()).await {
            seen += 1;
            on_update(&update);
        }
    }

    Ok(seen)
}

fn apply_chain_event(observer: &ScriptedObserver, hash: TxHash, step: &ReplayStep) {
    match step {
        ReplayStep::Replaced(new_hash) => {
            observer.replace(hash, *new_hash);
        }
        ReplayStep::Confirm {
            confirmations,
            block_number,
        } => {
            if let Some(n) = confirmations {
                observer.set_confirmations(hash, *n);
            }
            observer.confirm(hash, *block_number);
        }
        ReplayStep::Error(msg) => {
            observer.fail(hash, ObservationError::new(msg.as_str()));
        }
        ReplayStep::LookupError(msg) => {
            observer.fail_lookup(hash, ObservationError::new(msg.as_str()));
        }
        ReplayStep::Watch(_) | ReplayStep::Clear => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::{TransactionStatus, TxState};
    use std::sync::Arc;

    fn hex_hash(byte: &str) -> String {
        format!("0x{}", byte.repeat(32))
    }

    #[test]
    fn parses_every_step_kind() {
        let json = format!(
            r#"[{{"watch":"{a}"}},{{"replaced":"{b}"}},{{"confirm":{{}}}},
                {{"confirm":{{"confirmations":2,"block_number":7}}}},
                {{"error":"boom"}},{{"lookup_error":"down"}},"clear"]"#,
            a = hex_hash("aa"),
            b = hex_hash("bb"),
        );
        let steps = parse_script(&json).unwrap();

        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0], ReplayStep::Watch(TxHash::repeat_byte(0xaa)));
        assert_eq!(
            steps[2],
            ReplayStep::Confirm {
                confirmations: None,
                block_number: None
            }
        );
        assert_eq!(steps[6], ReplayStep::Clear);
    }

    #[test]
    fn rejects_malformed_hash() {
        assert!(parse_script(r#"[{"watch":"0x123"}]"#).is_err());
    }

    #[tokio::test]
    async fn replays_error_then_clear() {
        let observer = ScriptedObserver::new();
        let (watcher, mut stream) = TransactionWatcher::spawn(Arc::new(observer.clone()));
        let steps = vec![
            ReplayStep::Watch(TxHash::repeat_byte(0xcc)),
            ReplayStep::Error("insufficient gas".to_string()),
            ReplayStep::Clear,
            ReplayStep::Error("ignored".to_string()),
        ];

        let mut updates = Vec::new();
        let n = replay(
            &steps,
            &observer,
            &watcher,
            &mut stream,
            Duration::from_millis(50),
            |u| updates.push(u.clone()),
        )
        .await
        .unwrap();

        assert_eq!(n, 3);
        assert_eq!(updates[0], Some(TransactionStatus::pending(TxHash::repeat_byte(0xcc))));
        assert_eq!(updates[1].as_ref().map(|s| s.state), Some(TxState::Failed));
        assert_eq!(updates[2], None);
        assert_eq!(observer.live_subscriptions(), 0);

        watcher.shutdown().await.unwrap();
    }
}
