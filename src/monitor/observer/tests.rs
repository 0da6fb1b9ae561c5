use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::TxHash;
use tokio::sync::mpsc;

use crate::monitor::engine::WatchEvent;
use crate::monitor::observer::{EventSink, ObservationService, ScriptedObserver, SubscriptionHandle};
use crate::monitor::types::{ObservationError, ObservedEvent};

fn counting_handle() -> (SubscriptionHandle, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let handle = SubscriptionHandle::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (handle, calls)
}

#[test]
fn handle_releases_once_on_explicit_release() {
    let (handle, calls) = counting_handle();
    handle.release();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn handle_releases_on_drop() {
    let (handle, calls) = counting_handle();
    drop(handle);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn noop_handle_is_safe_to_release() {
    SubscriptionHandle::noop().release();
}

#[test]
fn sink_tags_events_with_generation() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = EventSink::new(4, tx);
    assert_eq!(sink.clone().generation(), 4);

    assert!(sink.replaced(TxHash::repeat_byte(2)));
    assert!(matches!(
        rx.try_recv().unwrap(),
        WatchEvent::Observed { generation: 4, event: ObservedEvent::Replaced(h) } if h == TxHash::repeat_byte(2)
    ));

    drop(rx);
    assert!(!sink.error(ObservationError::new("gone")), "closed channel reports false");
}

#[test]
fn scripted_observer_routes_by_tracked_hash() {
    let observer = ScriptedObserver::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let a = TxHash::repeat_byte(0xaa);
    let b = TxHash::repeat_byte(0xbb);

    let handle = observer.watch_transaction(a, EventSink::new(1, tx)).unwrap();
    assert_eq!(observer.live_subscriptions(), 1);

    assert_eq!(observer.replace(a, b), 1);
    // Subscriber now follows b
    assert_eq!(observer.confirm(a, None), 0);
    assert_eq!(observer.confirm(b, Some(10)), 1);

    assert!(matches!(
        rx.try_recv().unwrap(),
        WatchEvent::Observed { generation: 1, event: ObservedEvent::Replaced(h) } if h == b
    ));
    assert!(matches!(
        rx.try_recv().unwrap(),
        WatchEvent::Observed { generation: 1, event: ObservedEvent::Confirmed(c) } if c.hash == b
    ));

    handle.release();
    assert_eq!(observer.live_subscriptions(), 0);
    assert_eq!(observer.released(), vec![a]);
    assert_eq!(observer.fail(b, ObservationError::new("late")), 0);
}

#[test]
fn scripted_observer_can_refuse_subscriptions() {
    let observer = ScriptedObserver::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let a = TxHash::repeat_byte(1);
    observer.fail_subscribe(a, ObservationError::new("unknown transaction"));

    let err = observer.watch_transaction(a, EventSink::new(1, tx)).unwrap_err();
    assert_eq!(err.to_string(), "unknown transaction");
    assert_eq!(observer.live_subscriptions(), 0);
}

#[tokio::test]
async fn confirmation_lookup_reports_configured_count() {
    let observer = ScriptedObserver::new();
    let a = TxHash::repeat_byte(1);

    assert_eq!(observer.confirmation_count(a).await, Ok(None));
    observer.set_confirmations(a, 5);
    assert_eq!(observer.confirmation_count(a).await, Ok(Some(5)));

    observer.fail_lookup(a, ObservationError::new("rpc down"));
    assert_eq!(
        observer.confirmation_count(a).await,
        Err(ObservationError::new("rpc down"))
    );
    assert_eq!(observer.lookups().len(), 3);
}
